//! Cancelling an in-flight exchange from another task.

use std::sync::Arc;
use std::time::Duration;

use sntp::client::SntpClient;

#[tokio::main]
async fn main() {
    let client = Arc::new(SntpClient::new());

    // Cancel the exchange shortly after it starts.
    let canceller = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            client.cancel();
        })
    };

    // 192.0.2.1 is TEST-NET-1: nothing will ever answer, so without the
    // cancel this exchange would wait forever.
    match client.query_time("192.0.2.1:123").await {
        Ok(response) => println!("unexpectedly got a response:\n{}", response),
        Err(e) => println!("exchange ended: {}", e),
    }
    println!("client state: {:?}", client.state());

    canceller.await.unwrap();
}
