//! Check system capabilities.

use headmouse_common::config::AppConfig;
use headmouse_driver::permissions;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Headmouse System Check");
    println!("{}", "=".repeat(50));

    println!(
        "[INFO] Source: {:?}, sink: {:?}, tick rate: {} Hz",
        config.driver.source, config.driver.sink, config.driver.tick_rate_hz
    );
    match headmouse_transducer::TransducerConfig::from_tuning(&config.tuning) {
        Ok(_) => println!("[OK] Tuning is valid ({:?} mode)", config.tuning.mode),
        Err(e) => println!("[ERROR] Tuning is invalid: {e}"),
    }

    let capabilities = permissions::check_capabilities(&config.driver);
    println!();
    permissions::print_capability_report(&capabilities);

    let all_required_ok = !capabilities.iter().any(|c| c.is_blocking());

    println!();
    if all_required_ok {
        println!("All required capabilities are available. Headmouse is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}
