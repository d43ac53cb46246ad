use crate::docs::bpml::{Activity, Assign, BpmlProcess, MessageBlock};

/// Pipes would end the table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn describe_assign(assign: &Assign) -> String {
    let source = match (&assign.from, &assign.value) {
        (Some(from), _) => format!("from `{}`", from),
        (None, Some(value)) => format!("= `{}`", value),
        (None, None) => "(empty)".to_string(),
    };
    let append = if assign.append { " (append)" } else { "" };
    format!("`{}` {}{}", assign.to, source, append)
}

fn message_lines(direction: &str, block: &MessageBlock, indent: &str, out: &mut String) {
    let message = block.message.as_deref().unwrap_or("-");
    out.push_str(&format!("{}- {} `{}`\n", indent, direction, message));
    for assign in &block.assigns {
        out.push_str(&format!("{}  - {}\n", indent, describe_assign(assign)));
    }
}

fn outline(activities: &[Activity], depth: usize, out: &mut String) {
    let indent = "   ".repeat(depth);
    for (index, activity) in activities.iter().enumerate() {
        let label = match activity {
            Activity::Assign(assign) => format!("**Assign** {}", describe_assign(assign)),
            Activity::Repeat { name, reference } => format!(
                "**Repeat** `{}` → `{}`",
                name.as_deref().unwrap_or("-"),
                reference.as_deref().unwrap_or("-")
            ),
            Activity::Other { element, name } => match name {
                Some(name) => format!("`<{}>` `{}`", element, name),
                None => format!("`<{}>`", element),
            },
            other => match other.name() {
                Some(name) => format!("**{}** `{}`", other.kind_label(), name),
                None => format!("**{}**", other.kind_label()),
            },
        };
        out.push_str(&format!("{}{}. {}\n", indent, index + 1, label));

        let detail_indent = "   ".repeat(depth + 1);
        match activity {
            Activity::Operation { participant, output, input, .. } => {
                if let Some(participant) = participant {
                    out.push_str(&format!("{}- participant `{}`\n", detail_indent, participant));
                }
                if let Some(output) = output {
                    message_lines("output", output, &detail_indent, out);
                }
                if let Some(input) = input {
                    message_lines("input", input, &detail_indent, out);
                }
            }
            Activity::Choice { cases, .. } => {
                for case in cases {
                    let negation = if case.negative { "not " } else { "" };
                    out.push_str(&format!(
                        "{}- if {}`{}` then `{}`\n",
                        detail_indent, negation, case.rule, case.activity
                    ));
                }
            }
            _ => {}
        }

        outline(activity.children(), depth + 1, out);
    }
}

impl BpmlProcess {
    /// Human readable documentation: overview, participants, activity
    /// outline and rules.
    pub fn to_markdown(&self) -> String {
        let summary = self.summary();
        let mut out = format!("# Business Process `{}`\n\n", self.name);

        out.push_str("## Overview\n\n| Item | Count |\n| --- | --- |\n");
        for (item, count) in [
            ("Activities", summary.activities),
            ("Operations", summary.operations),
            ("Assignments", summary.assigns),
            ("Rules", summary.rules),
            ("Participants", summary.participants.len()),
        ] {
            out.push_str(&format!("| {} | {} |\n", item, count));
        }

        out.push_str("\n## Participants\n\n");
        let participants = self.participants();
        if participants.is_empty() {
            out.push_str("_None._\n");
        }
        for (participant, operations) in &participants {
            if operations.is_empty() {
                out.push_str(&format!("- `{}`\n", participant));
            } else {
                let used_by: Vec<String> = operations.iter().map(|o| format!("`{}`", o)).collect();
                out.push_str(&format!("- `{}`: used by {}\n", participant, used_by.join(", ")));
            }
        }

        out.push_str("\n## Activity Outline\n\n");
        if self.activities.is_empty() {
            out.push_str("_No activities._\n");
        }
        outline(&self.activities, 0, &mut out);

        out.push_str("\n## Rules\n\n");
        if self.rules.is_empty() {
            out.push_str("_None._\n");
        } else {
            out.push_str("| Rule | Condition |\n| --- | --- |\n");
            for rule in &self.rules {
                out.push_str(&format!("| {} | `{}` |\n", cell(&rule.name), cell(&rule.condition)));
            }
        }

        out
    }
}
