// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered fallback chains.
//!
//! Each attempt runs on its own and classifies its own failure; the first
//! success ends the chain. Failures of earlier attempts are kept so callers
//! can report why a fallback was taken.

/// Result of running a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome<T, E> {
    /// Label of the attempt that succeeded, with its value.
    pub success: Option<(&'static str, T)>,
    /// Failures of every attempt that ran before the success (or all of them).
    pub failures: Vec<(&'static str, E)>,
}

impl<T, E> ChainOutcome<T, E> {
    pub fn value(&self) -> Option<&T> {
        self.success.as_ref().map(|(_, value)| value)
    }

    pub fn label(&self) -> Option<&'static str> {
        self.success.as_ref().map(|(label, _)| *label)
    }

    pub fn into_value(self) -> Option<T> {
        self.success.map(|(_, value)| value)
    }
}

type Attempt<'a, I, T, E> = Box<dyn Fn(&I) -> Result<T, E> + 'a>;

/// A labelled list of attempts over an input `I`.
pub struct Chain<'a, I: ?Sized, T, E> {
    attempts: Vec<(&'static str, Attempt<'a, I, T, E>)>,
}

impl<'a, I: ?Sized, T, E> Default for Chain<'a, I, T, E> {
    fn default() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }
}

impl<'a, I: ?Sized, T, E> Chain<'a, I, T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attempt.
    pub fn then<F>(mut self, label: &'static str, attempt: F) -> Self
    where
        F: Fn(&I) -> Result<T, E> + 'a,
    {
        self.attempts.push((label, Box::new(attempt)));
        self
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Run attempts in order until one succeeds.
    pub fn run(&self, input: &I) -> ChainOutcome<T, E> {
        let mut failures = Vec::new();
        for (label, attempt) in &self.attempts {
            match attempt(input) {
                Ok(value) => {
                    return ChainOutcome {
                        success: Some((*label, value)),
                        failures,
                    }
                }
                Err(err) => failures.push((*label, err)),
            }
        }
        ChainOutcome {
            success: None,
            failures,
        }
    }
}
