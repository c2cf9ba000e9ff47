//! Rendering contexts that own the render side of the graph.

use std::{cell::RefCell, rc::Rc};

use crate::{error::EngineError, graph::SignalGraph};

/// The audio device (or a stand-in) the engine renders into.
pub trait AudioHost {
    fn sample_rate(&self) -> u32;

    /// Take ownership of the render side and start pulling blocks from it.
    fn start(&mut self, graph: SignalGraph) -> Result<(), EngineError>;
}

/// Renders on demand instead of from a device callback.
///
/// Clones share the same graph, so a test can hand one clone to the engine
/// and keep another to pull audio with `render`.
#[derive(Clone)]
pub struct OfflineHost {
    sample_rate: u32,
    graph: Rc<RefCell<Option<SignalGraph>>>,
}

impl OfflineHost {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            graph: Rc::new(RefCell::new(None)),
        }
    }

    pub fn is_started(&self) -> bool {
        self.graph.borrow().is_some()
    }

    /// Render `frames` frames. Silence until the engine has started the host.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        if let Some(graph) = self.graph.borrow_mut().as_mut() {
            graph.render_block(&mut out);
        }
        out
    }

    /// Run `f` against the render side, if started.
    pub fn with_graph<R>(&self, f: impl FnOnce(&SignalGraph) -> R) -> Option<R> {
        self.graph.borrow().as_ref().map(f)
    }
}

impl AudioHost for OfflineHost {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, graph: SignalGraph) -> Result<(), EngineError> {
        let mut slot = self.graph.borrow_mut();
        if slot.is_some() {
            return Err(EngineError::InvalidState("host already started"));
        }
        *slot = Some(graph);
        Ok(())
    }
}
