//! Configuration structures for the queueing network simulator
//!
//! This module contains the network configuration, the loaders for the
//! line-oriented and JSON configuration files, command line arguments, and the
//! validation that runs before any simulation starts.

use super::{Stage, TerminationMode};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Seed used when neither the configuration file nor the CLI provides one
pub const DEFAULT_SEED: u64 = 1;

/// Tolerance applied when checking that branch probabilities fit in [0, 1]
const PROBABILITY_EPSILON: f64 = 1e-9;

/// Per-stage service configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Number of parallel servers
    pub servers: usize,
    /// Mean of the exponential service time
    pub mean_service: f64,
}

impl StageConfig {
    /// Create a stage configuration
    pub fn new(servers: usize, mean_service: f64) -> Self {
        Self { servers, mean_service }
    }
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ed-sim",
    version = "0.1.0",
    about = "Emergency department queueing network simulator",
    long_about = "Runs a discrete-event simulation of an emergency department: patients arrive at triage, are discharged or routed to trauma, acute, or prompt care, and the run reports average delay, average queue length, and utilization per stage.

EXAMPLES:
    # Run with a line-oriented configuration file
    ed-sim ed.txt

    # Override the horizon and seed
    ed-sim ed.txt --end-time 5000 --seed 42

    # Keep serving patients already inside once arrivals stop
    ed-sim ed.txt --termination drain

    # Stop once the sixth patient enters triage service
    ed-sim ed.txt --max-served 6

    # Emit the report as JSON
    ed-sim ed.txt --output-format json

    # Generate a JSON configuration template
    ed-sim --print-config > ed.json

    # Validate configuration without running
    ed-sim ed.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (positional argument)
    3. Default values (lowest priority)

    Files ending in .json are read as JSON; any other file is read in the
    five-line whitespace-separated format."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        help = "Configuration file path",
        long_help = "Path to a configuration file. Files with a .json extension are parsed as JSON, anything else as the five-line text format. CLI arguments override file settings."
    )]
    pub config: Option<String>,

    /// Simulated time at which arrivals stop
    #[arg(long, help = "Simulation end time")]
    pub end_time: Option<f64>,

    /// Base seed for the random streams
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Termination mode
    #[arg(
        long,
        help = "Termination mode (horizon or drain)",
        long_help = "horizon stops as soon as the next event lies at or past the end time; drain stops arrivals at the end time and serves everyone already inside. Default: horizon"
    )]
    pub termination: Option<String>,

    /// Stop once this many patients have entered service at triage
    #[arg(
        long,
        conflicts_with = "termination",
        help = "Stop after N patients have entered triage service (same as --termination served:N)"
    )]
    pub max_served: Option<u64>,

    /// Report output format
    #[arg(long, help = "Output format (text or json)")]
    pub output_format: Option<String>,

    /// Directory for rolling log files
    #[arg(long, help = "Write JSON logs to a daily rolling file in this directory")]
    pub log_dir: Option<String>,

    /// Console log format
    #[arg(long, help = "Console log format (text or json)")]
    pub log_format: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Simulated time at which arrivals stop
    pub end_time: Option<f64>,

    /// Termination mode
    pub termination: Option<TerminationMode>,

    /// Base seed for the random streams
    pub seed: Option<u64>,

    /// Mean inter-arrival time at triage
    pub mean_inter_arrival: Option<f64>,

    /// Triage stage configuration
    pub triage: Option<StageConfig>,

    /// Trauma stage configuration
    pub trauma: Option<StageConfig>,

    /// Acute stage configuration
    pub acute: Option<StageConfig>,

    /// Prompt stage configuration
    pub prompt: Option<StageConfig>,

    /// Probability that a patient leaves after triage
    pub triage_discharge_prob: Option<f64>,

    /// Probability that a routed patient goes to trauma
    pub trauma_prob: Option<f64>,

    /// Probability that a routed patient goes to acute care
    pub acute_prob: Option<f64>,
}

/// Configuration for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Simulated time at which arrivals stop
    pub end_time: f64,

    /// Termination mode
    pub termination: TerminationMode,

    /// Base seed for the random streams
    pub seed: u64,

    /// Mean inter-arrival time at triage
    pub mean_inter_arrival: f64,

    /// Triage stage configuration
    pub triage: StageConfig,

    /// Trauma stage configuration
    pub trauma: StageConfig,

    /// Acute stage configuration
    pub acute: StageConfig,

    /// Prompt stage configuration
    pub prompt: StageConfig,

    /// Probability that a patient leaves after triage
    pub triage_discharge_prob: f64,

    /// Probability that a routed patient goes to trauma
    pub trauma_prob: f64,

    /// Probability that a routed patient goes to acute care
    pub acute_prob: f64,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Malformed line in the text configuration format
    #[error("Malformed configuration line {line}: {message}")]
    Parse {
        /// Zero-based logical line number
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// Command line value that could not be interpreted
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Validation errors for network configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// End time is negative or not finite
    #[error("End time must be finite and non-negative, got {0}")]
    InvalidEndTime(f64),

    /// A stage has no servers
    #[error("{stage} must have at least one server, got {servers}")]
    InvalidServerCount {
        /// Stage with the invalid count
        stage: Stage,
        /// The invalid count
        servers: usize,
    },

    /// A distribution mean is not positive
    #[error("Mean for {parameter} must be positive, got {value}")]
    InvalidMean {
        /// Name of the parameter with the invalid mean
        parameter: String,
        /// The invalid mean
        value: f64,
    },

    /// Probability value is out of range
    #[error("Invalid probability for {field}: {value} (must be between 0.0 and 1.0)")]
    InvalidProbability {
        /// Name of the field with invalid probability
        field: String,
        /// The invalid probability value
        value: f64,
    },

    /// Trauma and acute branch probabilities exceed 1
    #[error("trauma_prob + acute_prob must not exceed 1.0, got {sum}")]
    InvalidBranchSum {
        /// The actual sum of the branch probabilities
        sum: f64,
    },

    /// A served-count termination that could never be reached
    #[error("Served-count termination needs at least one patient, got {0}")]
    InvalidServedCount(u64),
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            end_time: 1_000.0,
            termination: TerminationMode::Horizon,
            seed: DEFAULT_SEED,
            mean_inter_arrival: 2.0,
            triage: StageConfig::new(2, 1.5),
            trauma: StageConfig::new(1, 5.0),
            acute: StageConfig::new(2, 3.0),
            prompt: StageConfig::new(2, 2.0),
            triage_discharge_prob: 0.2,
            trauma_prob: 0.1,
            acute_prob: 0.3,
        }
    }
}

impl NetworkConfig {
    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // CLI takes precedence over the file
        Self::apply_cli_overrides(&mut config, args)?;

        Ok(config)
    }

    /// Load configuration from a file (JSON, or the five-line text format)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            _ => Self::from_line_format(&content),
        }
    }

    /// Parse the five-line whitespace-separated format
    ///
    /// ```text
    /// end_time
    /// triage_servers triage_inter_arrival_mean triage_service_mean triage_discharge_prob
    /// trauma_servers trauma_service_mean trauma_prob
    /// acute_servers  acute_service_mean  acute_prob
    /// prompt_servers prompt_service_mean [prompt_prob]
    /// ```
    ///
    /// Blank lines and `#` comments are skipped. The optional prompt probability
    /// is accepted but ignored; prompt always receives the routing remainder.
    pub fn from_line_format(content: &str) -> Result<Self, ConfigError> {
        let lines: Vec<Vec<&str>> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.split_whitespace().collect())
            .collect();

        if lines.len() < 5 {
            return Err(ConfigError::Parse {
                line: lines.len(),
                message: format!("expected 5 configuration lines, found {}", lines.len()),
            });
        }
        if lines.len() > 5 {
            return Err(ConfigError::Parse {
                line: 5,
                message: format!("expected 5 configuration lines, found {}", lines.len()),
            });
        }

        let end = expect_fields(&lines[0], 0, 1, 1)?;
        let triage = expect_fields(&lines[1], 1, 4, 4)?;
        let trauma = expect_fields(&lines[2], 2, 3, 3)?;
        let acute = expect_fields(&lines[3], 3, 3, 3)?;
        let prompt = expect_fields(&lines[4], 4, 2, 3)?;

        if let Some(extra) = prompt.get(2) {
            // Validated as a number so typos still fail loudly
            parse_value::<f64>(extra, 4, "prompt_prob")?;
        }

        Ok(Self {
            end_time: parse_value(end[0], 0, "simulation_end_time")?,
            mean_inter_arrival: parse_value(triage[1], 1, "triage_inter_arrival_mean")?,
            triage: StageConfig::new(
                parse_count(triage[0], 1, "triage_servers")?,
                parse_value(triage[2], 1, "triage_service_mean")?,
            ),
            triage_discharge_prob: parse_value(triage[3], 1, "triage_discharge_prob")?,
            trauma: StageConfig::new(
                parse_count(trauma[0], 2, "trauma_servers")?,
                parse_value(trauma[1], 2, "trauma_service_mean")?,
            ),
            trauma_prob: parse_value(trauma[2], 2, "trauma_prob")?,
            acute: StageConfig::new(
                parse_count(acute[0], 3, "acute_servers")?,
                parse_value(acute[1], 3, "acute_service_mean")?,
            ),
            acute_prob: parse_value(acute[2], 3, "acute_prob")?,
            prompt: StageConfig::new(
                parse_count(prompt[0], 4, "prompt_servers")?,
                parse_value(prompt[1], 4, "prompt_service_mean")?,
            ),
            ..Self::default()
        })
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            end_time: config_file.end_time.unwrap_or(defaults.end_time),
            termination: config_file.termination.unwrap_or(defaults.termination),
            seed: config_file.seed.unwrap_or(defaults.seed),
            mean_inter_arrival: config_file
                .mean_inter_arrival
                .unwrap_or(defaults.mean_inter_arrival),
            triage: config_file.triage.unwrap_or(defaults.triage),
            trauma: config_file.trauma.unwrap_or(defaults.trauma),
            acute: config_file.acute.unwrap_or(defaults.acute),
            prompt: config_file.prompt.unwrap_or(defaults.prompt),
            triage_discharge_prob: config_file
                .triage_discharge_prob
                .unwrap_or(defaults.triage_discharge_prob),
            trauma_prob: config_file.trauma_prob.unwrap_or(defaults.trauma_prob),
            acute_prob: config_file.acute_prob.unwrap_or(defaults.acute_prob),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) -> Result<(), ConfigError> {
        if let Some(value) = args.end_time {
            config.end_time = value;
        }
        if let Some(value) = args.seed {
            config.seed = value;
        }
        if let Some(value) = args.termination {
            config.termination =
                TerminationMode::from_str(&value).map_err(ConfigError::InvalidArgument)?;
        }
        if let Some(count) = args.max_served {
            config.termination = TerminationMode::Served(count);
        }
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.end_time.is_finite() || self.end_time < 0.0 {
            return Err(ConfigValidationError::InvalidEndTime(self.end_time));
        }

        for stage in Stage::ALL {
            let servers = self.stage(stage).servers;
            if servers == 0 {
                return Err(ConfigValidationError::InvalidServerCount { stage, servers });
            }
        }

        // An infinite inter-arrival mean is allowed and means "no arrivals"
        if !(self.mean_inter_arrival > 0.0) {
            return Err(ConfigValidationError::InvalidMean {
                parameter: "triage_inter_arrival_mean".to_string(),
                value: self.mean_inter_arrival,
            });
        }
        for stage in Stage::ALL {
            let mean = self.stage(stage).mean_service;
            if !(mean > 0.0) || !mean.is_finite() {
                return Err(ConfigValidationError::InvalidMean {
                    parameter: format!("{}_service_mean", stage.to_string().to_lowercase()),
                    value: mean,
                });
            }
        }

        self.validate_probability("triage_discharge_prob", self.triage_discharge_prob)?;
        self.validate_probability("trauma_prob", self.trauma_prob)?;
        self.validate_probability("acute_prob", self.acute_prob)?;

        let branch_sum = self.trauma_prob + self.acute_prob;
        if branch_sum > 1.0 + PROBABILITY_EPSILON {
            return Err(ConfigValidationError::InvalidBranchSum { sum: branch_sum });
        }

        if self.termination == TerminationMode::Served(0) {
            return Err(ConfigValidationError::InvalidServedCount(0));
        }

        Ok(())
    }

    /// Helper method to validate probability values
    fn validate_probability(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigValidationError::InvalidProbability {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    /// Service configuration of one stage
    pub fn stage(&self, stage: Stage) -> &StageConfig {
        match stage {
            Stage::Triage => &self.triage,
            Stage::Trauma => &self.trauma,
            Stage::Acute => &self.acute,
            Stage::Prompt => &self.prompt,
        }
    }

    /// Probability that a routed patient goes to prompt care
    pub fn prompt_prob(&self) -> f64 {
        (1.0 - self.trauma_prob - self.acute_prob).max(0.0)
    }
}

fn expect_fields<'a>(
    fields: &'a [&'a str],
    line: usize,
    min: usize,
    max: usize,
) -> Result<&'a [&'a str], ConfigError> {
    if fields.len() < min || fields.len() > max {
        let expected = if min == max { min.to_string() } else { format!("{} to {}", min, max) };
        return Err(ConfigError::Parse {
            line,
            message: format!("expected {} fields, found {}", expected, fields.len()),
        });
    }
    Ok(fields)
}

fn parse_value<T: FromStr>(raw: &str, line: usize, field: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::Parse {
        line,
        message: format!("{} is not a number: {:?}", field, raw),
    })
}

/// Server counts may be written as `2` or `2.0`, never `2.5`
fn parse_count(raw: &str, line: usize, field: &str) -> Result<usize, ConfigError> {
    if let Ok(count) = raw.parse::<usize>() {
        return Ok(count);
    }
    let value: f64 = parse_value(raw, line, field)?;
    if value.fract() != 0.0 || value < 0.0 || !value.is_finite() {
        return Err(ConfigError::Parse {
            line,
            message: format!("{} must be a whole number, got {}", field, raw),
        });
    }
    Ok(value as usize)
}
