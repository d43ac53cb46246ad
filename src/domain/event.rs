use crate::api::metadata_dto::ScheduleDto;
use crate::domain::property::{PropertySet, PropertyTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Once,
    Interval { minutes: u32 },
    Cron { expression: String },
}

pub fn map_schedule(dto: &ScheduleDto) -> Schedule {
    match dto {
        ScheduleDto::Once => Schedule::Once,
        ScheduleDto::Interval { minutes } => Schedule::Interval { minutes: *minutes },
        ScheduleDto::Cron { expression } => Schedule::Cron { expression: expression.clone() },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartEventKind {
    /// Triggered by the sender participant's message flow.
    Message,
    /// Used when the flow has no sender endpoint.
    Timer(Schedule),
}

/// The synthesized start of the integration process.
#[derive(Debug, Clone, PartialEq)]
pub struct StartEvent {
    pub element_id: String,
    pub name: String,
    pub kind: StartEventKind,
    /// Keys to `Iflow.sequence_flows`
    pub outgoing: Vec<String>,
}

impl StartEvent {
    pub fn properties(&self) -> PropertySet {
        match &self.kind {
            StartEventKind::Message => PropertySet::from_pairs(&[
                ("componentVersion", "1.0"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::MessageStartEvent/version::1.0"),
            ]),
            StartEventKind::Timer(schedule) => {
                let mut table = PropertyTable::new();
                let fire_now = match schedule {
                    Schedule::Once => "true",
                    Schedule::Interval { minutes } => {
                        table.push_row(&[("triggerType", "simple"), ("interval", format!("{}m", minutes).as_str())]);
                        "false"
                    }
                    Schedule::Cron { expression } => {
                        table.push_row(&[("triggerType", "cron"), ("expression", expression.as_str())]);
                        "false"
                    }
                };
                PropertySet::from_pairs(&[
                    ("scheduleKey", table.encode().as_str()),
                    ("fireNow", fire_now),
                    ("componentVersion", "1.4"),
                    ("activityType", "StartTimerEvent"),
                    ("cmdVariantUri", "ctype::FlowstepVariant/cname::intermediatetimer/version::1.4.0"),
                ])
            }
        }
    }
}

/// A synthesized end of the integration process; one per sink component.
#[derive(Debug, Clone, PartialEq)]
pub struct EndEvent {
    pub element_id: String,
    pub name: String,
    /// Keys to `Iflow.sequence_flows`
    pub incoming: Vec<String>,
}

impl EndEvent {
    pub fn properties(&self) -> PropertySet {
        PropertySet::from_pairs(&[
            ("componentVersion", "1.1"),
            ("cmdVariantUri", "ctype::FlowstepVariant/cname::MessageEndEvent/version::1.1.0"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_timer_encodes_schedule_table() {
        let event = StartEvent {
            element_id: "StartEvent_1".to_string(),
            name: "Start Timer".to_string(),
            kind: StartEventKind::Timer(Schedule::Cron { expression: "0 0 * * * ?".to_string() }),
            outgoing: vec![],
        };

        let props = event.properties();
        assert_eq!(props.get("fireNow"), Some("false"));
        assert_eq!(
            props.get("scheduleKey"),
            Some("<row><cell id='triggerType'>cron</cell><cell id='expression'>0 0 * * * ?</cell></row>")
        );
    }
}
