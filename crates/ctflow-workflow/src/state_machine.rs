//! 扫描状态机
//!
//! 管理患者扫描生命周期的状态转换。旧系统允许任意处理器把
//! scan_status 覆盖成任意值，这里改为显式转换表，不在表中的
//! 转换一律拒绝。

use ctflow_core::{CtflowError, Result, ScanStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 扫描状态转换事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScanEvent {
    SendToNursing,
    SendToConsole,
    NursingPrepare,
    NursingComplete,
    ConsoleComplete,
    ConsolePending,
    ConsoleRecall,
    Reopen,
}

impl ScanEvent {
    /// 操作台记录的目标状态对应的事件
    ///
    /// 文本状态先经 `ScanStatus::from_console_text` 映射；未识别的
    /// 文本映射为 Registered，没有对应事件，由调用方拒绝。
    pub fn for_console_status(status: ScanStatus) -> Option<Self> {
        match status {
            ScanStatus::Complete => Some(ScanEvent::ConsoleComplete),
            ScanStatus::PendingAtConsole => Some(ScanEvent::ConsolePending),
            ScanStatus::Recall => Some(ScanEvent::ConsoleRecall),
            _ => None,
        }
    }
}

/// 扫描状态机
#[derive(Debug)]
pub struct ScanStateMachine {
    transitions: HashMap<(ScanStatus, ScanEvent), ScanStatus>,
}

impl ScanStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        // 接待台路由
        transitions.insert((ScanStatus::Registered, ScanEvent::SendToNursing), ScanStatus::Complete);
        transitions.insert((ScanStatus::Registered, ScanEvent::SendToConsole), ScanStatus::SentToConsole);
        transitions.insert((ScanStatus::Complete, ScanEvent::SendToConsole), ScanStatus::SentToConsole);
        transitions.insert((ScanStatus::Recall, ScanEvent::SendToConsole), ScanStatus::SentToConsole);

        // 护理台
        transitions.insert((ScanStatus::Registered, ScanEvent::NursingPrepare), ScanStatus::SentToConsole);
        transitions.insert((ScanStatus::Complete, ScanEvent::NursingPrepare), ScanStatus::SentToConsole);
        transitions.insert((ScanStatus::Registered, ScanEvent::NursingComplete), ScanStatus::Complete);
        transitions.insert((ScanStatus::SentToConsole, ScanEvent::NursingComplete), ScanStatus::Complete);

        // 操作台记录扫描结果
        transitions.insert((ScanStatus::SentToConsole, ScanEvent::ConsoleComplete), ScanStatus::Complete);
        transitions.insert((ScanStatus::SentToConsole, ScanEvent::ConsolePending), ScanStatus::PendingAtConsole);
        transitions.insert((ScanStatus::SentToConsole, ScanEvent::ConsoleRecall), ScanStatus::Recall);
        transitions.insert((ScanStatus::PendingAtConsole, ScanEvent::ConsoleComplete), ScanStatus::Complete);
        transitions.insert((ScanStatus::PendingAtConsole, ScanEvent::ConsolePending), ScanStatus::PendingAtConsole);
        transitions.insert((ScanStatus::PendingAtConsole, ScanEvent::ConsoleRecall), ScanStatus::Recall);

        // 管理端重开记录
        transitions.insert((ScanStatus::Complete, ScanEvent::Reopen), ScanStatus::Registered);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: ScanStatus, event: &ScanEvent) -> bool {
        self.transitions.contains_key(&(from, event.clone()))
    }

    /// 执行状态转换
    pub fn transition(&self, from: ScanStatus, event: &ScanEvent) -> Result<ScanStatus> {
        match self.transitions.get(&(from, event.clone())) {
            Some(to) => Ok(*to),
            None => Err(CtflowError::InvalidStateTransition {
                from: from.as_str().to_string(),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 获取所有可能的状态
    pub fn all_states() -> Vec<ScanStatus> {
        vec![
            ScanStatus::Registered,
            ScanStatus::Complete,
            ScanStatus::SentToConsole,
            ScanStatus::Recall,
            ScanStatus::PendingAtConsole,
        ]
    }

    /// 获取状态的所有可能事件
    pub fn possible_events(&self, current: ScanStatus) -> Vec<ScanEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| *state == current)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

impl Default for ScanStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let sm = ScanStateMachine::new();

        assert!(sm.can_transition(ScanStatus::Registered, &ScanEvent::SendToNursing));
        assert!(sm.can_transition(ScanStatus::Registered, &ScanEvent::SendToConsole));
        assert!(sm.can_transition(ScanStatus::SentToConsole, &ScanEvent::ConsoleComplete));
        assert!(sm.can_transition(ScanStatus::Recall, &ScanEvent::SendToConsole));
    }

    #[test]
    fn test_invalid_transitions() {
        let sm = ScanStateMachine::new();

        // 已完成的患者不能再次转入护理队列
        assert!(!sm.can_transition(ScanStatus::Complete, &ScanEvent::SendToNursing));
        // 未送操作台的患者不能直接记录扫描结果
        assert!(!sm.can_transition(ScanStatus::Registered, &ScanEvent::ConsoleComplete));
        assert!(!sm.can_transition(ScanStatus::Recall, &ScanEvent::ConsoleComplete));
    }

    #[test]
    fn test_transition_execution() {
        let sm = ScanStateMachine::new();

        let next = sm.transition(ScanStatus::Registered, &ScanEvent::SendToConsole).unwrap();
        assert_eq!(next, ScanStatus::SentToConsole);

        let next = sm.transition(next, &ScanEvent::ConsolePending).unwrap();
        assert_eq!(next, ScanStatus::PendingAtConsole);

        let next = sm.transition(next, &ScanEvent::ConsoleComplete).unwrap();
        assert_eq!(next, ScanStatus::Complete);

        let result = sm.transition(ScanStatus::Complete, &ScanEvent::ConsoleComplete);
        assert!(matches!(result, Err(CtflowError::InvalidStateTransition { .. })));
    }

    #[test]
    fn test_recall_cycle() {
        let sm = ScanStateMachine::new();

        let recalled = sm.transition(ScanStatus::SentToConsole, &ScanEvent::ConsoleRecall).unwrap();
        assert_eq!(recalled, ScanStatus::Recall);

        let resent = sm.transition(recalled, &ScanEvent::SendToConsole).unwrap();
        assert_eq!(resent, ScanStatus::SentToConsole);
    }

    #[test]
    fn test_console_event_mapping() {
        assert_eq!(
            ScanEvent::for_console_status(ScanStatus::from_console_text("Complete")),
            Some(ScanEvent::ConsoleComplete)
        );
        assert_eq!(
            ScanEvent::for_console_status(ScanStatus::from_console_text("Pending")),
            Some(ScanEvent::ConsolePending)
        );
        assert_eq!(
            ScanEvent::for_console_status(ScanStatus::from_console_text("Recall")),
            Some(ScanEvent::ConsoleRecall)
        );
        // 未识别的文本没有对应事件，调用方应拒绝请求
        assert_eq!(ScanEvent::for_console_status(ScanStatus::from_console_text("junk")), None);
    }

    #[test]
    fn test_possible_events() {
        let sm = ScanStateMachine::new();

        let events = sm.possible_events(ScanStatus::SentToConsole);
        assert!(events.contains(&ScanEvent::ConsoleComplete));
        assert!(events.contains(&ScanEvent::ConsolePending));
        assert!(events.contains(&ScanEvent::ConsoleRecall));
        assert!(!events.contains(&ScanEvent::SendToConsole));
    }
}
