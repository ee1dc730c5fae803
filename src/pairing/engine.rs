//! Secret santa assignment.
//!
//! The engine shuffles the participants, reverses the shuffled order to get the
//! receivers and, for odd counts, swaps the first receiver with the middle one.
//! Reversal never maps an index onto itself except for the middle element of an
//! odd-length sequence, and the swap moves exactly that element away, so every
//! shuffle yields a valid assignment for three or more distinct participants.
//! The result is checked anyway before it leaves the engine.
//!
//! This is not a uniformly random derangement: an even count always produces
//! mutual pairs and many cycle shapes are unreachable.

use std::{collections::HashSet, fmt::Debug, hash::Hash};

use rand::{seq::SliceRandom, Rng};
use thiserror::Error;
use tracing::warn;

pub const MIN_PARTICIPANTS: usize = 3;
pub const MAX_ATTEMPTS: u32 = 10;

/// A giver → receiver edge that has not been persisted yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Assignment<T> {
    pub giver: T,
    pub receiver: T,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError<T: Debug> {
    #[error("At least {} participants are needed, got {count}", MIN_PARTICIPANTS)]
    InsufficientParticipants { count: usize },
    #[error("Participant {0:?} is listed more than once")]
    DuplicateParticipant(T),
    #[error("Could not produce a valid assignment in {attempts} attempts")]
    GenerationFailed { attempts: u32 },
}

#[derive(Debug, PartialEq, Eq)]
enum Violation<T> {
    SelfAssignment(T),
    MissingGiver(T),
    MissingReceiver(T),
    WrongSize { expected: usize, actual: usize },
}

/// Computes a giver → receiver assignment over `participants`.
///
/// On success every participant is a giver exactly once and a receiver exactly
/// once, and nobody gives to themself.
pub fn compute_assignment<T, R>(
    participants: &[T],
    rng: &mut R,
) -> Result<Vec<Assignment<T>>, EngineError<T>>
where
    T: Copy + Eq + Hash + Debug,
    R: Rng + ?Sized,
{
    if participants.len() < MIN_PARTICIPANTS {
        return Err(EngineError::InsufficientParticipants {
            count: participants.len(),
        });
    }

    {
        let mut seen = HashSet::with_capacity(participants.len());
        if let Some(duplicate) = participants.iter().find(|id| !seen.insert(**id)) {
            return Err(EngineError::DuplicateParticipant(*duplicate));
        }
    }

    for attempt in 1..=MAX_ATTEMPTS {
        let assignment = shuffle_and_rotate(participants, rng);

        match validate(participants, &assignment) {
            Ok(()) => return Ok(assignment),
            Err(violation) => {
                warn!("Assignment attempt {attempt} is invalid: {violation:?}");
            }
        }
    }

    Err(EngineError::GenerationFailed {
        attempts: MAX_ATTEMPTS,
    })
}

fn shuffle_and_rotate<T, R>(participants: &[T], rng: &mut R) -> Vec<Assignment<T>>
where
    T: Copy,
    R: Rng + ?Sized,
{
    let mut givers = participants.to_vec();
    givers.shuffle(rng);

    let mut receivers = givers.clone();
    receivers.reverse();

    if receivers.len() % 2 != 0 {
        let middle = receivers.len() / 2;
        receivers.swap(0, middle);
    }

    givers
        .into_iter()
        .zip(receivers)
        .map(|(giver, receiver)| Assignment { giver, receiver })
        .collect()
}

fn validate<T>(participants: &[T], assignment: &[Assignment<T>]) -> Result<(), Violation<T>>
where
    T: Copy + Eq + Hash,
{
    if assignment.len() != participants.len() {
        return Err(Violation::WrongSize {
            expected: participants.len(),
            actual: assignment.len(),
        });
    }

    if let Some(pair) = assignment.iter().find(|pair| pair.giver == pair.receiver) {
        return Err(Violation::SelfAssignment(pair.giver));
    }

    let givers = assignment.iter().map(|p| p.giver).collect::<HashSet<_>>();
    let receivers = assignment.iter().map(|p| p.receiver).collect::<HashSet<_>>();

    for participant in participants {
        if !givers.contains(participant) {
            return Err(Violation::MissingGiver(*participant));
        }
        if !receivers.contains(participant) {
            return Err(Violation::MissingReceiver(*participant));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::{
        compute_assignment, shuffle_and_rotate, validate, Assignment, EngineError, Violation,
        MIN_PARTICIPANTS,
    };

    fn ids(count: u64) -> Vec<u64> {
        (1..=count).collect()
    }

    fn assert_valid(participants: &[u64], assignment: &[Assignment<u64>]) {
        assert_eq!(assignment.len(), participants.len());

        let expected = participants.iter().copied().collect::<HashSet<_>>();
        let givers = assignment.iter().map(|a| a.giver).collect::<HashSet<_>>();
        let receivers = assignment.iter().map(|a| a.receiver).collect::<HashSet<_>>();

        assert_eq!(givers, expected);
        assert_eq!(receivers, expected);
        assert!(assignment.iter().all(|a| a.giver != a.receiver));
    }

    #[test]
    fn covers_everyone_exactly_once() {
        let mut rng = StdRng::seed_from_u64(2024);

        for count in 3..=40 {
            let participants = ids(count);
            let assignment = compute_assignment(&participants, &mut rng).unwrap();
            assert_valid(&participants, &assignment);
        }
    }

    #[test]
    fn never_assigns_anyone_to_themself() {
        let mut rng = StdRng::seed_from_u64(7);

        for count in [3, 4, 5, 10, 11] {
            let participants = ids(count);

            for _ in 0..10_000 {
                let assignment = compute_assignment(&participants, &mut rng).unwrap();
                assert!(
                    assignment.iter().all(|a| a.giver != a.receiver),
                    "self-assignment for {count} participants: {assignment:?}"
                );
            }
        }
    }

    #[test]
    fn raw_shuffle_is_always_valid() {
        let mut rng = StdRng::seed_from_u64(99);

        for count in 3..=25 {
            let participants = ids(count);
            for _ in 0..500 {
                let assignment = shuffle_and_rotate(&participants, &mut rng);
                assert_eq!(validate(&participants, &assignment), Ok(()));
            }
        }
    }

    #[test]
    fn same_seed_same_assignment() {
        let participants = ids(11);

        let first = compute_assignment(&participants, &mut StdRng::seed_from_u64(5)).unwrap();
        let second = compute_assignment(&participants, &mut StdRng::seed_from_u64(5)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn works_with_any_id_type() {
        let participants = ['A', 'B', 'C', 'D', 'E'];
        let assignment =
            compute_assignment(&participants, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(assignment.len(), 5);
        for name in participants {
            assert_eq!(assignment.iter().filter(|a| a.giver == name).count(), 1);
            assert_eq!(assignment.iter().filter(|a| a.receiver == name).count(), 1);
        }
    }

    #[test]
    fn too_few_participants() {
        let mut rng = StdRng::seed_from_u64(0);

        for count in 0..MIN_PARTICIPANTS as u64 {
            assert_eq!(
                compute_assignment(&ids(count), &mut rng),
                Err(EngineError::InsufficientParticipants {
                    count: count as usize
                })
            );
        }
    }

    #[test]
    fn duplicates_are_rejected() {
        assert_eq!(
            compute_assignment(&[1, 2, 3, 2], &mut StdRng::seed_from_u64(0)),
            Err(EngineError::DuplicateParticipant(2))
        );
    }

    #[test]
    fn validation_catches_broken_assignments() {
        let participants = ids(3);

        assert_eq!(
            validate(
                &participants,
                &[
                    Assignment { giver: 1, receiver: 1 },
                    Assignment { giver: 2, receiver: 3 },
                    Assignment { giver: 3, receiver: 2 },
                ]
            ),
            Err(Violation::SelfAssignment(1))
        );

        assert_eq!(
            validate(
                &participants,
                &[
                    Assignment { giver: 1, receiver: 2 },
                    Assignment { giver: 2, receiver: 1 },
                    Assignment { giver: 3, receiver: 1 },
                ]
            ),
            Err(Violation::MissingReceiver(3))
        );

        assert_eq!(
            validate(&participants, &[Assignment { giver: 1, receiver: 2 }]),
            Err(Violation::WrongSize {
                expected: 3,
                actual: 1
            })
        );
    }
}
