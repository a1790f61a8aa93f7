use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelationType {
    #[default]
    #[serde(rename = "FS", alias = "finish_to_start")]
    FinishToStart,
    #[serde(rename = "SS", alias = "start_to_start")]
    StartToStart,
    #[serde(rename = "FF", alias = "finish_to_finish")]
    FinishToFinish,
    #[serde(rename = "SF", alias = "start_to_finish")]
    StartToFinish,
}

impl RelationType {
    pub fn code(&self) -> &'static str {
        match self {
            RelationType::FinishToStart => "FS",
            RelationType::StartToStart => "SS",
            RelationType::FinishToFinish => "FF",
            RelationType::StartToFinish => "SF",
        }
    }

    /// Earliest start offset a successor of `successor_duration` days may take,
    /// given its predecessor's early start/finish offsets.
    pub fn earliest_successor_start(
        &self,
        pred_early_start: i64,
        pred_early_finish: i64,
        lag_days: i64,
        successor_duration: i64,
    ) -> i64 {
        match self {
            RelationType::FinishToStart => pred_early_finish + lag_days,
            RelationType::StartToStart => pred_early_start + lag_days,
            RelationType::FinishToFinish => pred_early_finish + lag_days - successor_duration,
            RelationType::StartToFinish => pred_early_start + lag_days - successor_duration,
        }
    }

    /// Latest finish offset a predecessor of `predecessor_duration` days may take,
    /// given its successor's late start/finish offsets.
    pub fn latest_predecessor_finish(
        &self,
        succ_late_start: i64,
        succ_late_finish: i64,
        lag_days: i64,
        predecessor_duration: i64,
    ) -> i64 {
        match self {
            RelationType::FinishToStart => succ_late_start - lag_days,
            RelationType::StartToStart => succ_late_start - lag_days + predecessor_duration,
            RelationType::FinishToFinish => succ_late_finish - lag_days,
            RelationType::StartToFinish => succ_late_finish - lag_days + predecessor_duration,
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RelationType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FS" | "FINISH_TO_START" => Ok(RelationType::FinishToStart),
            "SS" | "START_TO_START" => Ok(RelationType::StartToStart),
            "FF" | "FINISH_TO_FINISH" => Ok(RelationType::FinishToFinish),
            "SF" | "START_TO_FINISH" => Ok(RelationType::StartToFinish),
            other => Err(format!("unknown relation type '{other}'")),
        }
    }
}

/// Precedence edge between two tasks. A negative lag is a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub predecessor_id: TaskId,
    pub successor_id: TaskId,
    #[serde(default)]
    pub relation_type: RelationType,
    #[serde(default)]
    pub lag_days: i64,
}

impl Relation {
    pub fn new(
        predecessor_id: TaskId,
        successor_id: TaskId,
        relation_type: RelationType,
        lag_days: i64,
    ) -> Self {
        Self {
            predecessor_id,
            successor_id,
            relation_type,
            lag_days,
        }
    }

    pub fn finish_to_start(predecessor_id: TaskId, successor_id: TaskId) -> Self {
        Self::new(predecessor_id, successor_id, RelationType::FinishToStart, 0)
    }

    /// Predecessor notation as seen from the successor, e.g. `2FS+3` or `4SS-1`.
    pub fn notation(&self) -> String {
        let mut out = format!("{}{}", self.predecessor_id, self.relation_type.code());
        if self.lag_days != 0 {
            out.push_str(&format!("{:+}", self.lag_days));
        }
        out
    }

    /// Parse a single notation entry (`2`, `2SS`, `2FF+1`, `2SF-3`) into a relation
    /// pointing at `successor_id`.
    pub fn parse_notation(successor_id: TaskId, input: &str) -> Result<Self, String> {
        let entry = input.trim();
        let digits_end = entry
            .char_indices()
            .find(|(idx, ch)| !(ch.is_ascii_digit() || (*idx == 0 && *ch == '-')))
            .map(|(idx, _)| idx)
            .unwrap_or(entry.len());
        let (id_part, rest) = entry.split_at(digits_end);
        let predecessor_id = id_part
            .parse::<TaskId>()
            .map_err(|err| format!("invalid predecessor id in '{entry}': {err}"))?;
        if rest.is_empty() {
            return Ok(Self::finish_to_start(predecessor_id, successor_id));
        }
        if rest.len() < 2 || !rest.is_char_boundary(2) {
            return Err(format!("invalid relation notation '{entry}'"));
        }
        let (type_part, lag_part) = rest.split_at(2);
        let relation_type = type_part.parse::<RelationType>()?;
        let lag_days = if lag_part.is_empty() {
            0
        } else {
            lag_part
                .trim_start_matches('+')
                .parse::<i64>()
                .map_err(|err| format!("invalid lag in '{entry}': {err}"))?
        };
        Ok(Self::new(predecessor_id, successor_id, relation_type, lag_days))
    }
}

pub fn format_predecessor_list(relations: &[Relation]) -> String {
    relations
        .iter()
        .map(Relation::notation)
        .collect::<Vec<_>>()
        .join(";")
}

pub fn parse_predecessor_list(successor_id: TaskId, input: &str) -> Result<Vec<Relation>, String> {
    input
        .split(';')
        .filter(|part| !part.trim().is_empty())
        .map(|part| Relation::parse_notation(successor_id, part))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notation_round_trips_lag_and_lead() {
        let lag = Relation::new(2, 5, RelationType::FinishToStart, 3);
        let lead = Relation::new(4, 5, RelationType::StartToStart, -1);
        assert_eq!(lag.notation(), "2FS+3");
        assert_eq!(lead.notation(), "4SS-1");
        assert_eq!(Relation::parse_notation(5, "2FS+3"), Ok(lag));
        assert_eq!(Relation::parse_notation(5, "4SS-1"), Ok(lead));
    }

    #[test]
    fn bare_id_defaults_to_finish_to_start() {
        assert_eq!(
            Relation::parse_notation(9, " 7 "),
            Ok(Relation::finish_to_start(7, 9))
        );
    }

    #[test]
    fn predecessor_list_rejects_unknown_relation_codes() {
        assert!(parse_predecessor_list(3, "1FS;2XX+1").is_err());
        let parsed = parse_predecessor_list(3, "1FS;2FF+1").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].relation_type, RelationType::FinishToFinish);
        assert_eq!(format_predecessor_list(&parsed), "1FS;2FF+1");
    }

    #[test]
    fn backward_formulas_invert_forward_formulas() {
        // pred (3 days) and succ (2 days) pinned so every relation is exactly tight
        for relation in [
            RelationType::FinishToStart,
            RelationType::StartToStart,
            RelationType::FinishToFinish,
            RelationType::StartToFinish,
        ] {
            let (pred_start, pred_duration, succ_duration, lag) = (4, 3, 2, 1);
            let succ_start =
                relation.earliest_successor_start(pred_start, pred_start + pred_duration, lag, succ_duration);
            let pred_finish = relation.latest_predecessor_finish(
                succ_start,
                succ_start + succ_duration,
                lag,
                pred_duration,
            );
            assert_eq!(pred_finish, pred_start + pred_duration, "{relation}");
        }
    }
}
