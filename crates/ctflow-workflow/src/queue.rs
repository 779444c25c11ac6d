//! 队列路由
//!
//! 接待台"转出"操作的目标队列与对应状态机事件。

use crate::state_machine::ScanEvent;
use ctflow_core::{CtflowError, Result};
use serde::{Deserialize, Serialize};

/// 路由目标队列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteDestination {
    Nursing,
    Console,
}

impl RouteDestination {
    pub fn parse(text: &str) -> Result<Self> {
        match text.to_ascii_lowercase().as_str() {
            "nursing" => Ok(RouteDestination::Nursing),
            "console" => Ok(RouteDestination::Console),
            _ => Err(CtflowError::Validation(format!(
                "Unknown destination '{}', expected nursing or console",
                text
            ))),
        }
    }

    /// 目标队列对应的状态机事件
    pub fn event(&self) -> ScanEvent {
        match self {
            RouteDestination::Nursing => ScanEvent::SendToNursing,
            RouteDestination::Console => ScanEvent::SendToConsole,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDestination::Nursing => "nursing",
            RouteDestination::Console => "console",
        }
    }
}

/// 路由请求体 {destination, cro}
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    pub destination: String,
    pub cro: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_parse() {
        assert_eq!(RouteDestination::parse("nursing").unwrap(), RouteDestination::Nursing);
        assert_eq!(RouteDestination::parse("Console").unwrap(), RouteDestination::Console);
        assert!(RouteDestination::parse("doctor").is_err());
    }

    #[test]
    fn test_destination_event() {
        assert_eq!(RouteDestination::Nursing.event(), ScanEvent::SendToNursing);
        assert_eq!(RouteDestination::Console.event(), ScanEvent::SendToConsole);
    }
}
