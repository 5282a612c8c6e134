//! Undo/Redo command stack.
//!
//! Every committed edit is wrapped in a reversible `Command`. Single edits
//! store the mutation and its inverse. Drag gestures, template inserts and
//! loads use **layout-snapshot batching**: the full canvas state is captured
//! before and after, so undo/redo swaps the whole state in one step.

use crate::engine::{CanvasEngine, CanvasMutation};
use studio_core::model::Layout;

#[derive(Debug, Clone)]
pub enum Command {
    Single {
        forward: Box<CanvasMutation>,
        inverse: Box<CanvasMutation>,
        description: String,
    },
    Snapshot {
        before: Box<Layout>,
        after: Box<Layout>,
        description: String,
    },
}

impl Command {
    pub fn description(&self) -> &str {
        match self {
            Self::Single { description, .. } | Self::Snapshot { description, .. } => description,
        }
    }
}

/// Manages undo/redo stacks with batch grouping for gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// State captured when the outermost batch opened.
    batch_snapshot: Option<Layout>,
    batch_description: String,
    batch_dirty: bool,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(128)),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
            batch_description: String::new(),
            batch_dirty: false,
        }
    }

    /// Open a batch. Mutations until the matching `end_batch` are applied
    /// live and recorded as one undo step.
    pub fn begin_batch(&mut self, engine: &CanvasEngine, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(engine.layout());
            self.batch_description = description.to_string();
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes and the state changed,
    /// one snapshot command is pushed. Returns whether one was.
    pub fn end_batch(&mut self, engine: &CanvasEngine) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        let before = self.batch_snapshot.take();
        let dirty = std::mem::take(&mut self.batch_dirty);
        let description = std::mem::take(&mut self.batch_description);
        match before {
            Some(before) if dirty => self.record(before, engine.layout(), &description),
            _ => false,
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Apply a mutation and push it to the undo stack. Returns whether the
    /// engine changed; no-op mutations are not recorded.
    pub fn execute(&mut self, engine: &mut CanvasEngine, mutation: CanvasMutation, description: &str) -> bool {
        if self.batch_depth > 0 {
            let changed = engine.apply_mutation(mutation);
            self.batch_dirty |= changed;
            return changed;
        }

        let mutation = engine.prepare(mutation);
        let Some(inverse) = engine.inverse_of(&mutation) else {
            return engine.apply_mutation(mutation);
        };
        if !engine.apply_mutation(mutation.clone()) {
            return false;
        }
        self.push(Command::Single {
            forward: Box::new(mutation),
            inverse: Box::new(inverse),
            description: description.to_string(),
        });
        true
    }

    /// Record a state swap performed outside `execute` (loads, bulk edits).
    /// Identical states are not recorded.
    pub fn record(&mut self, before: Layout, after: Layout, description: &str) -> bool {
        if before == after {
            return false;
        }
        self.push(Command::Snapshot {
            before: Box::new(before),
            after: Box::new(after),
            description: description.to_string(),
        });
        true
    }

    fn push(&mut self, command: Command) {
        log::debug!("recorded `{}`", command.description());
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Undo the last command. Returns its description.
    pub fn undo(&mut self, engine: &mut CanvasEngine) -> Option<String> {
        let cmd = self.undo_stack.pop()?;
        match &cmd {
            Command::Single { inverse, .. } => {
                engine.apply_mutation(*inverse.clone());
            }
            Command::Snapshot { before, .. } => engine.restore(*before.clone()),
        }
        let desc = cmd.description().to_string();
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command. Returns its description.
    pub fn redo(&mut self, engine: &mut CanvasEngine) -> Option<String> {
        let cmd = self.redo_stack.pop()?;
        match &cmd {
            Command::Single { forward, .. } => {
                engine.apply_mutation(*forward.clone());
            }
            Command::Snapshot { after, .. } => engine.restore(*after.clone()),
        }
        let desc = cmd.description().to_string();
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }
}
