//! Example demonstrating how to access detailed SNTP message information.
//!
//! Dumps every header field via the Display implementation, then pulls a few
//! fields out for closer interpretation, which is useful for debugging or
//! detailed analysis.

#[tokio::main]
async fn main() {
    let address = "pool.ntp.org:123";

    println!("Requesting SNTP message from {}...\n", address);

    match sntp::query_time(address).await {
        Ok(response) => {
            println!("{}", response);

            let stratum = response.stratum();
            match stratum.0 {
                0 => println!("stratum 0: kiss code {:?}", response.reference_id_text()),
                1 => println!(
                    "stratum 1: primary reference ({})",
                    response.reference_id_text()
                ),
                2..=15 => println!(
                    "stratum {}: secondary reference, synchronized via {}",
                    stratum,
                    response.reference_id_ipv4()
                ),
                16 => println!("stratum 16: server clock unsynchronized"),
                _ => println!("stratum {}: reserved", stratum),
            }

            println!(
                "poll interval: {} seconds (2^{})",
                2.0f64.powi(response.poll().into()),
                response.poll()
            );
            println!(
                "precision: {} seconds (2^{})",
                2.0f64.powi(response.precision().into()),
                response.precision()
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
