//! The capped, ordered set of jobs an account holds.
//!
//! Insertion order is preserved, titles never repeat, and the set never exceeds
//! [`MAX_HELD_JOBS`]. The JSON text encoding lives in [`column`] and is only used at the
//! storage edge.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::domain::JobTitle;

pub const MAX_HELD_JOBS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<JobTitle>", into = "Vec<JobTitle>")]
pub struct HeldJobs {
    jobs: SmallVec<[JobTitle; MAX_HELD_JOBS]>,
}

/// Result of [`HeldJobs::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    AlreadyHeld,
    LimitReached,
}

/// Result of [`HeldJobs::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
    LimitReached,
}

impl HeldJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() >= MAX_HELD_JOBS
    }

    pub fn contains(&self, job: JobTitle) -> bool {
        self.jobs.contains(&job)
    }

    pub fn iter(&self) -> impl Iterator<Item = JobTitle> + '_ {
        self.jobs.iter().copied()
    }

    pub fn as_slice(&self) -> &[JobTitle] {
        &self.jobs
    }

    pub fn to_vec(&self) -> Vec<JobTitle> {
        self.jobs.to_vec()
    }

    /// Append `job` unless it is already held or the set is full.
    pub fn add(&mut self, job: JobTitle) -> AddOutcome {
        if self.contains(job) {
            AddOutcome::AlreadyHeld
        } else if self.is_full() {
            AddOutcome::LimitReached
        } else {
            self.jobs.push(job);
            AddOutcome::Added
        }
    }

    /// Remove `job` if held. Returns whether anything changed.
    pub fn remove(&mut self, job: JobTitle) -> bool {
        match self.jobs.iter().position(|held| *held == job) {
            Some(index) => {
                self.jobs.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn toggle(&mut self, job: JobTitle) -> ToggleOutcome {
        if self.remove(job) {
            return ToggleOutcome::Removed;
        }
        match self.add(job) {
            AddOutcome::Added => ToggleOutcome::Added,
            AddOutcome::AlreadyHeld | AddOutcome::LimitReached => ToggleOutcome::LimitReached,
        }
    }

    /// Replace the whole set. Repeats are dropped and anything past the cap is clipped
    /// silently, keeping the first entries in order.
    pub fn set<I>(&mut self, jobs: I)
    where
        I: IntoIterator<Item = JobTitle>,
    {
        self.jobs.clear();
        for job in jobs {
            if self.is_full() {
                break;
            }
            if !self.contains(job) {
                self.jobs.push(job);
            }
        }
    }
}

impl FromIterator<JobTitle> for HeldJobs {
    fn from_iter<I: IntoIterator<Item = JobTitle>>(iter: I) -> Self {
        let mut held = HeldJobs::new();
        held.set(iter);
        held
    }
}

impl From<Vec<JobTitle>> for HeldJobs {
    fn from(jobs: Vec<JobTitle>) -> Self {
        jobs.into_iter().collect()
    }
}

impl From<HeldJobs> for Vec<JobTitle> {
    fn from(held: HeldJobs) -> Self {
        held.jobs.into_vec()
    }
}

/// Text-column encoding: a JSON array of job labels in a nullable column.
pub mod column {
    use super::{HeldJobs, JobTitle};

    pub fn encode(held: &HeldJobs) -> Option<String> {
        let labels: Vec<&str> = held.iter().map(JobTitle::label).collect();
        serde_json::to_string(&labels).ok()
    }

    /// Lenient decode: absent or malformed text reads as no jobs, unknown labels are skipped
    /// and the result is clipped to the cap.
    pub fn decode(raw: Option<&str>) -> HeldJobs {
        let Some(raw) = raw else {
            return HeldJobs::new();
        };
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(labels) => labels
                .iter()
                .filter_map(|label| label.parse::<JobTitle>().ok())
                .collect(),
            Err(_) => HeldJobs::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use JobTitle::*;

    #[test]
    fn add_is_noop_when_present_or_full() {
        let mut held = HeldJobs::new();
        assert_eq!(held.add(Judge), AddOutcome::Added);
        assert_eq!(held.add(Judge), AddOutcome::AlreadyHeld);
        assert_eq!(held.add(Lawyer), AddOutcome::Added);
        assert_eq!(held.add(Coach), AddOutcome::Added);
        assert_eq!(held.add(Soldier), AddOutcome::LimitReached);
        assert_eq!(held.as_slice(), &[Judge, Lawyer, Coach]);
    }

    #[test]
    fn remove_only_touches_present_jobs() {
        let mut held: HeldJobs = vec![Judge, Lawyer].into();
        assert!(!held.remove(Coach));
        assert!(held.remove(Judge));
        assert_eq!(held.as_slice(), &[Lawyer]);
    }

    #[test]
    fn toggle_reports_tristate() {
        let mut held: HeldJobs = vec![Judge, Lawyer, Coach].into();
        assert_eq!(held.toggle(Soldier), ToggleOutcome::LimitReached);
        assert_eq!(held.toggle(Lawyer), ToggleOutcome::Removed);
        assert_eq!(held.toggle(Soldier), ToggleOutcome::Added);
        assert_eq!(held.as_slice(), &[Judge, Coach, Soldier]);
    }

    #[test]
    fn set_truncates_silently_in_order() {
        let mut held = HeldJobs::new();
        held.set([Policeman, Soldier, Judge, Lawyer]);
        assert_eq!(held.to_vec(), vec![Policeman, Soldier, Judge]);

        held.set([Coach, Coach, Lawyer]);
        assert_eq!(held.to_vec(), vec![Coach, Lawyer]);
    }

    #[test]
    fn cap_holds_under_any_operation_sequence() {
        let mut held = HeldJobs::new();
        for (step, job) in JobTitle::ALL.iter().cycle().take(40).enumerate() {
            match step % 3 {
                0 => {
                    held.add(*job);
                }
                1 => {
                    held.toggle(*job);
                }
                _ => held.set(JobTitle::ALL.iter().copied().skip(step % 6)),
            }
            assert!(held.len() <= MAX_HELD_JOBS);
            let mut seen = held.to_vec();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), held.len());
        }
    }

    #[test]
    fn deserializing_clips_to_cap() {
        let held: HeldJobs =
            serde_json::from_str(r#"["Judge","Lawyer","Coach","Soldier"]"#).expect("parses");
        assert_eq!(held.to_vec(), vec![Judge, Lawyer, Coach]);
        assert_eq!(
            serde_json::to_string(&held).expect("serializes"),
            r#"["Judge","Lawyer","Coach"]"#
        );
    }

    #[test]
    fn column_round_trip_and_lenient_decode() {
        let held: HeldJobs = vec![Journalist, Judge].into();
        let encoded = column::encode(&held).expect("encodes");
        assert_eq!(encoded, r#"["Journalist","Judge"]"#);
        assert_eq!(column::decode(Some(&encoded)), held);

        assert!(column::decode(None).is_empty());
        assert!(column::decode(Some("not json")).is_empty());
        assert_eq!(
            column::decode(Some(r#"["Judge","Astronaut","Coach"]"#)).to_vec(),
            vec![Judge, Coach]
        );
    }
}
