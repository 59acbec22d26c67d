// Forwards to the `log` facade when the `logging` feature is enabled and
// expands to nothing otherwise. Arguments must not carry side effects.

macro_rules! log_debug {
  ($($arg:tt)+) => {
    #[cfg(feature = "logging")]
    {
      ::log::debug!(target: "simtab", $($arg)+);
    }
  };
}

macro_rules! log_warn {
  ($($arg:tt)+) => {
    #[cfg(feature = "logging")]
    {
      ::log::warn!(target: "simtab", $($arg)+);
    }
  };
}

pub(crate) use log_debug;
pub(crate) use log_warn;
