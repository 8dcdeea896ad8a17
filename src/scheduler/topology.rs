//! Capture topology
//!
//! Static-per-run mapping of sources to their card inputs and of inputs to
//! the card that owns them. Built once from the capture inventory when the
//! scheduler is constructed and read-only afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{CardId, InputId, SourceId};
use crate::storage::CaptureInventory;

use super::error::{SchedulerError, SchedulerResult};

/// How a source is wired to card inputs
#[derive(Debug, Clone, PartialEq, Eq)]
enum SourceBinding {
    /// Defined, but not attached to any card input
    Unbound,
    /// Ordered card inputs fed by this source
    Inputs(Vec<InputId>),
}

/// Read-only source/input/card mapping for one scheduler instance
#[derive(Debug, Clone)]
pub struct CaptureTopology {
    sources: BTreeMap<SourceId, SourceBinding>,
    input_cards: HashMap<InputId, CardId>,
    cards: BTreeSet<CardId>,
}

impl CaptureTopology {
    /// Build the topology from inventory data
    ///
    /// No cards or no sources is fatal. A source without inputs is fatal only
    /// when `strict` is set; otherwise it is logged and left unbound.
    pub fn from_inventory(inventory: &CaptureInventory, strict: bool) -> SchedulerResult<Self> {
        if inventory.cards.is_empty() {
            tracing::error!("No capture cards are defined in the database");
            return Err(SchedulerError::NoCaptureCards);
        }
        if inventory.sources.is_empty() {
            tracing::error!("No channel sources are defined in the database");
            return Err(SchedulerError::NoSources);
        }

        let mut sources = BTreeMap::new();
        for source in &inventory.sources {
            let inputs: Vec<InputId> = inventory
                .inputs
                .iter()
                .filter(|input| input.source_id == source.source_id)
                .map(|input| input.input_id)
                .collect();

            if inputs.is_empty() {
                if strict {
                    return Err(SchedulerError::unbound_source(
                        source.source_id,
                        source.name.clone(),
                    ));
                }
                tracing::warn!(
                    source_id = source.source_id,
                    name = %source.name,
                    "Source is defined, but isn't attached to a card input"
                );
                sources.insert(source.source_id, SourceBinding::Unbound);
            } else {
                sources.insert(source.source_id, SourceBinding::Inputs(inputs));
            }
        }

        let input_cards = inventory
            .inputs
            .iter()
            .map(|input| (input.input_id, input.card_id))
            .collect();

        let topology = Self {
            sources,
            input_cards,
            cards: inventory.cards.iter().copied().collect(),
        };

        tracing::info!(
            cards = topology.card_count(),
            sources = topology.sources.len(),
            inputs = topology.input_cards.len(),
            "Capture topology loaded"
        );

        Ok(topology)
    }

    /// Number of capture cards
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn is_multi_card(&self) -> bool {
        self.card_count() > 1
    }

    /// Ordered inputs bound to a source; empty when unbound or unknown
    pub fn inputs_for(&self, source_id: SourceId) -> &[InputId] {
        match self.sources.get(&source_id) {
            Some(SourceBinding::Inputs(inputs)) => inputs,
            _ => &[],
        }
    }

    /// The only input of a single-input source
    pub fn sole_input(&self, source_id: SourceId) -> Option<InputId> {
        match self.inputs_for(source_id) {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// First input of a bound source
    pub fn first_input(&self, source_id: SourceId) -> Option<InputId> {
        self.inputs_for(source_id).first().copied()
    }

    /// Whether a candidate on this source can move between inputs
    pub fn is_movable(&self, source_id: SourceId) -> bool {
        self.inputs_for(source_id).len() > 1
    }

    /// Card owning an input
    pub fn card_for(&self, input_id: InputId) -> Option<CardId> {
        self.input_cards.get(&input_id).copied()
    }
}
