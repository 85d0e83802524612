use clap::Parser;
use padded_struct_fixture::{
  config::{DEFAULT_INT_START, DEFAULT_LONG_START},
  GridConfig
};

#[derive(Parser)]
#[command(
  name = "padded-struct-fixture",
  about = "Fill and verify buffers of the small_struct_2 padded layout"
)]
struct Cli {
  /// Grid width
  #[arg(long, default_value_t = 2)]
  dim_x: u32,
  /// Grid height
  #[arg(long, default_value_t = 2)]
  dim_y: u32,
  /// Seed for the 4-byte field (decimal or 0x hex)
  #[arg(long, value_parser = parse_i32, allow_hyphen_values = true)]
  int_start: Option<i32>,
  /// Seed for the 8-byte field (decimal or 0x hex)
  #[arg(long, value_parser = parse_i64, allow_hyphen_values = true)]
  long_start: Option<i64>
}

fn parse_i64(s: &str) -> Result<i64, String> {
  let (sign, digits) = s.strip_prefix('-').map_or(("", s), |rest| ("-", rest));
  let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
    // a second sign after the prefix is not a number
    Some(hex) if hex.starts_with(['+', '-']) => return Err(format!("`{s}`: invalid digit")),
    Some(hex) => i64::from_str_radix(&format!("{sign}{hex}"), 16),
    None => s.parse::<i64>()
  };
  parsed.map_err(|err| format!("`{s}`: {err}"))
}

fn parse_i32(s: &str) -> Result<i32, String> {
  let value = parse_i64(s)?;
  i32::try_from(value).map_err(|_| format!("`{s}` does not fit in 32 bits"))
}

fn main() -> anyhow::Result<()> {
  env_logger::init();
  let cli = Cli::parse();

  let config = GridConfig {
    dim_x:      cli.dim_x,
    dim_y:      cli.dim_y,
    int_start:  cli.int_start.unwrap_or(DEFAULT_INT_START),
    long_start: cli.long_start.unwrap_or(DEFAULT_LONG_START)
  };

  let outcome = padded_struct_fixture::run(&config)?;
  for mismatch in &outcome.verdict.mismatches {
    println!("{mismatch}");
  }

  if outcome.passed() {
    println!("small_struct_2 test PASSED");
    Ok(())
  } else {
    println!("small_struct_2 test FAILED");
    std::process::exit(1);
  }
}
