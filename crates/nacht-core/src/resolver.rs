//! Value resolution
//!
//! Expands a [`Params`] request against the previous [`State`] into an ordered
//! sequence of concrete [`Patch`]es:
//!
//! 1. Literals and derivations are computed immediately and emitted together
//!    as the first patch, unless that patch would be empty.
//! 2. Every producer is then consumed concurrently; each value it yields
//!    becomes a single-key patch. Order is preserved within one producer
//!    only.
//!
//! A failing derivation aborts resolution with [`NachtError::Derivation`]. A
//! failing producer item becomes a [`NachtError::Producer`] element in the
//! sequence and ends that producer; other producers keep running.

use std::fmt;

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};

use crate::errors::{NachtError, Result};
use crate::params::{ParamValue, Params, Patch, Producer, State};

/// A producer bound to the key it feeds.
pub struct KeyedProducer {
    key: String,
    producer: Producer,
}

impl KeyedProducer {
    /// The key this producer feeds.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Turn the producer into a stream of single-key patches.
    ///
    /// The stream ends after the first failed item.
    pub fn into_patches(self) -> BoxStream<'static, Result<Patch>> {
        let key = self.key;
        let mut failed = false;
        self.producer
            .into_inner()
            .take_while(move |item| {
                let keep = !failed;
                failed = item.is_err();
                future::ready(keep)
            })
            .map(move |item| match item {
                Ok(value) => Ok(Patch::single(key.clone(), value)),
                Err(message) => Err(NachtError::producer(key.clone(), message)),
            })
            .boxed()
    }
}

impl fmt::Debug for KeyedProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedProducer").field("key", &self.key).finish()
    }
}

/// The outcome of resolving one request.
///
/// Holds the immediately computed patch (if any) and the producers that will
/// feed later patches. Consumed once; each `resolve` call starts fresh.
#[derive(Debug, Default)]
pub struct Resolution {
    initial: Option<Patch>,
    producers: Vec<KeyedProducer>,
}

impl Resolution {
    /// The immediately computed patch, if any key resolved synchronously.
    pub fn initial(&self) -> Option<&Patch> {
        self.initial.as_ref()
    }

    /// Keys fed by producers, in request order.
    pub fn producer_keys(&self) -> impl Iterator<Item = &str> {
        self.producers.iter().map(KeyedProducer::key)
    }

    /// True when resolution produces no patches at all.
    pub fn is_empty(&self) -> bool {
        self.initial.is_none() && self.producers.is_empty()
    }

    /// True when producers remain to be consumed.
    pub fn has_producers(&self) -> bool {
        !self.producers.is_empty()
    }

    /// Split into the immediate patch and the merged producer stream.
    pub fn split(self) -> (Option<Patch>, BoxStream<'static, Result<Patch>>) {
        let producers = self
            .producers
            .into_iter()
            .map(KeyedProducer::into_patches)
            .collect::<Vec<_>>();
        (self.initial, stream::select_all(producers).boxed())
    }

    /// The whole lazy sequence: the immediate patch first, then producer
    /// patches as they arrive.
    pub fn into_stream(self) -> BoxStream<'static, Result<Patch>> {
        let (initial, rest) = self.split();
        stream::iter(initial.map(Ok)).chain(rest).boxed()
    }
}

/// Resolve a request against the previous state.
pub fn resolve(params: Params, previous: &State) -> Result<Resolution> {
    let mut immediate = Patch::new();
    let mut producers = Vec::new();

    for (key, value) in params {
        match value {
            ParamValue::Literal(v) => {
                immediate.insert(key, v);
            }
            ParamValue::Derive(derivation) => {
                let derived = derivation
                    .derive(previous.get(&key))
                    .map_err(|message| NachtError::derivation(key.as_str(), message))?;
                immediate.insert(key, derived);
            }
            ParamValue::Stream(producer) => producers.push(KeyedProducer { key, producer }),
        }
    }

    tracing::trace!(
        immediate = immediate.len(),
        producers = producers.len(),
        "resolved request"
    );

    Ok(Resolution {
        initial: (!immediate.is_empty()).then_some(immediate),
        producers,
    })
}
