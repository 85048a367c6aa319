//! How to request the time from an SNTP server.

use chrono::TimeZone;

fn local_time(t: sntp::timestamp::Instant) -> chrono::DateTime<chrono::Local> {
    chrono::Local
        .timestamp_opt(t.secs(), t.subsec_nanos() as _)
        .unwrap()
}

#[tokio::main]
async fn main() {
    let address = "time.nist.gov:123";
    let response = sntp::query_time(address).await.unwrap();
    println!("Timestamps in local time:");
    println!("  reference: {}", local_time(response.reference_timestamp()));
    println!("  origin:    {}", local_time(response.origin_timestamp()));
    println!("  receive:   {}", local_time(response.receive_timestamp()));
    println!("  transmit:  {}", local_time(response.transmit_timestamp()));
    if let Some(destination) = response.destination_timestamp() {
        println!("  arrival:   {}", local_time(destination));
    }
    if let Some(offset) = response.local_clock_offset() {
        println!("\nTiming:");
        println!("  offset: {:.6} seconds", offset);
    }
}
