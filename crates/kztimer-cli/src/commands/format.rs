use clap::Args;
use kztimer_core::format_time;

#[derive(Args)]
pub struct FormatArgs {
    /// Time in seconds
    #[arg(allow_negative_numbers = true)]
    seconds: f64,
    /// Include milliseconds
    #[arg(long)]
    precise: bool,
}

pub fn run(args: FormatArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.seconds.is_finite() || args.seconds < 0.0 {
        return Err(format!(
            "time must be a non-negative number of seconds, got {}",
            args.seconds
        )
        .into());
    }
    println!("{}", format_time(args.seconds, args.precise));
    Ok(())
}
