// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The datagram transport capability consumed by the client.
//!
//! An exchange performs exactly one send and one receive and owns its
//! transport for that span, so implementations only need the two socket
//! primitives below. The trait is implemented for [`tokio::net::UdpSocket`]
//! (which the convenience entry points bind internally); test suites and
//! custom socket stacks plug in the same way.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

/// An asynchronous datagram socket.
///
/// Returned futures must be `Send` so exchanges can run on multithreaded
/// runtimes. Implementations may simply use `async fn`.
pub trait Transport {
    /// Sends `buf` as a single datagram to `target`, resolving with the
    /// number of bytes sent.
    fn send_to(
        &self,
        buf: &[u8],
        target: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send;

    /// Receives a single datagram into `buf` from any source, resolving with
    /// the number of bytes received and the source address.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;
}

impl Transport for tokio::net::UdpSocket {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        tokio::net::UdpSocket::send_to(self, buf, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        tokio::net::UdpSocket::recv_from(self, buf).await
    }
}
