//! Example demonstrating the use of custom timeouts with SNTP requests.
//!
//! This example shows how to use `query_time_with_timeout()` to specify
//! custom timeout durations, which is useful when dealing with slow or
//! unreliable network connections.

use std::time::Duration;

#[tokio::main]
async fn main() {
    // Example 1: Using a longer timeout for slow networks
    println!("Example 1: Request with 10 second timeout");
    match sntp::query_time_with_timeout("pool.ntp.org:123", Duration::from_secs(10)).await {
        Ok(response) => {
            println!("  Success! Stratum: {}", response.stratum());
            println!("  Server mode: {:?}", response.mode());
        }
        Err(e) => println!("  Error: {}", e),
    }

    // Example 2: Using the default 5 second timeout
    println!("\nExample 2: Request with default timeout (5 seconds)");
    match sntp::query_time("0.pool.ntp.org:123").await {
        Ok(response) => {
            println!("  Success! Version: {}", response.version());
        }
        Err(e) => println!("  Error: {}", e),
    }

    // Example 3: Very short timeout to demonstrate timeout errors
    println!("\nExample 3: Request with very short timeout (1ms)");
    match sntp::query_time_with_timeout("pool.ntp.org:123", Duration::from_millis(1)).await {
        Ok(_) => println!("  Unlikely success!"),
        Err(e) => println!("  Expected timeout error: {}", e),
    }
}
