use stderrlog::Timestamp;

/// Logging setup arg group.
#[derive(clap::Args, Debug)]
pub struct LogArgs {
    /// Silence log messages.
    #[clap(short, long)]
    pub quiet: bool,

    /// Turn debugging information on (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, default_value = None)]
    verbose: Option<u8>,

    /// Enable timestamped logging.
    #[clap(long)]
    pub ts: bool,
}

impl LogArgs {
    /// The stderr log level; ``default`` applies when no ``-v`` is given.
    pub fn log_level(
        &self,
        default: u8,
    ) -> stderrlog::LogLevelNum {
        let level = match self.verbose {
            Some(verbose) if verbose > 0 => verbose,
            _ => default,
        };

        match level {
            0 => stderrlog::LogLevelNum::Off,
            1 => stderrlog::LogLevelNum::Error,
            2 => stderrlog::LogLevelNum::Warn,
            3 => stderrlog::LogLevelNum::Info,
            4 => stderrlog::LogLevelNum::Debug,
            _ => stderrlog::LogLevelNum::Trace,
        }
    }

    /// Install the stderr logger.
    pub fn setup_logging(
        &self,
        default: u8,
    ) -> Result<(), Box<dyn std::error::Error>> {
        stderrlog::new()
            .quiet(self.quiet)
            .verbosity(self.log_level(default))
            .timestamp(if self.ts {
                Timestamp::Second
            } else {
                Timestamp::Off
            })
            .init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use serial_test::serial;

    use super::*;

    #[derive(clap::Parser, Debug)]
    struct TestArgs {
        #[clap(flatten)]
        logging: LogArgs,
    }

    #[test]
    fn test_log_level() {
        let args = TestArgs::parse_from(["test"]);
        assert!(matches!(args.logging.log_level(2), stderrlog::LogLevelNum::Warn));

        let args = TestArgs::parse_from(["test", "-vvvv"]);
        assert!(matches!(args.logging.log_level(2), stderrlog::LogLevelNum::Debug));
    }

    #[test]
    #[serial]
    fn test_setup_logging_once() {
        let args = TestArgs::parse_from(["test", "-q"]);
        assert!(args.logging.quiet);
        args.logging.setup_logging(3).unwrap();
        // The global logger is already installed.
        assert!(args.logging.setup_logging(3).is_err());
    }
}
