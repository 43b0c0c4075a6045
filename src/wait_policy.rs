//! What a thread does on each iteration of a spin-wait loop.
//!
//! Every blocking wait in this crate is a polling loop. The policy only decides
//! how much of the processor a waiting thread gives back between polls:
//!
//! | policy  | latency | cpu     | notes                                    |
//! |---------|---------|---------|------------------------------------------|
//! | `Spin`  | lowest  | highest | dedicated cores                          |
//! | `Pause` | low     | high    | hints the core, sibling hyperthread wins |
//! | `Yield` | medium  | low     | survives oversubscription                |

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaitPolicy {
    /// Re-check immediately.
    Spin,
    /// Give the rest of the time slice back to the scheduler.
    #[default]
    Yield,
    /// Emit a spin-loop hint (`PAUSE` on x86, `YIELD`/`ISB` on arm).
    Pause,
}

impl WaitPolicy {
    pub const ALL: [WaitPolicy; 3] = [WaitPolicy::Spin, WaitPolicy::Yield, WaitPolicy::Pause];

    #[inline(always)]
    pub fn relax(self) {
        match self {
            WaitPolicy::Spin => {}
            WaitPolicy::Yield => std::thread::yield_now(),
            WaitPolicy::Pause => std::hint::spin_loop(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WaitPolicy::Spin => "spin",
            WaitPolicy::Yield => "yield",
            WaitPolicy::Pause => "pause",
        }
    }
}

impl fmt::Display for WaitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WaitPolicy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WaitPolicy::ALL
            .into_iter()
            .find(|policy| policy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::unknown("wait policy", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_yield() {
        assert_eq!(WaitPolicy::default(), WaitPolicy::Yield);
    }

    #[test]
    fn parses_its_own_names() {
        for policy in WaitPolicy::ALL {
            assert_eq!(policy.to_string().parse::<WaitPolicy>().unwrap(), policy);
        }
        assert_eq!("PAUSE".parse::<WaitPolicy>().unwrap(), WaitPolicy::Pause);
        assert!("sleep".parse::<WaitPolicy>().is_err());
    }

    #[test]
    fn relax_returns() {
        for policy in WaitPolicy::ALL {
            for _ in 0..16 {
                policy.relax();
            }
        }
    }
}
