use logrotator::{RotatorBuilder, SizeLimit};
use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut logger = RotatorBuilder::new()
        .path("./logs/logger.log")
        .max_size(SizeLimit::KB(256))
        .max_backups(3)
        .build()?;

    writeln!(logger, "This is an info message")?;
    writeln!(logger, "This is a warning message")?;
    writeln!(logger, "This is an error message")?;

    Ok(())
}
