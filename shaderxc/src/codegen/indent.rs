//! Indentation handler (spec §4.8): a stack of push/pop deltas rather than a
//! single counter, so a scope that changes indent by something other than
//! one level (e.g. a case label inside a `switch`) composes cleanly.
pub struct IndentHandler {
    deltas: Vec<i32>,
    unit: String,
}

impl IndentHandler {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { deltas: Vec::new(), unit: unit.into() }
    }

    pub fn push(&mut self) {
        self.deltas.push(1);
    }

    pub fn push_by(&mut self, delta: i32) {
        self.deltas.push(delta);
    }

    pub fn pop(&mut self) {
        self.deltas.pop();
    }

    fn level(&self) -> i32 {
        self.deltas.iter().sum::<i32>().max(0)
    }

    pub fn prefix(&self) -> String {
        self.unit.repeat(self.level() as usize)
    }
}

/// RAII guard: pushes one indent level on construction, pops it on drop, so a
/// scope body can be written with `?` returns without forgetting to unwind
/// the indent stack.
pub struct IndentGuard<'a> {
    handler: &'a mut IndentHandler,
}

impl<'a> IndentGuard<'a> {
    pub fn enter(handler: &'a mut IndentHandler) -> Self {
        handler.push();
        Self { handler }
    }
}

impl Drop for IndentGuard<'_> {
    fn drop(&mut self) {
        self.handler.pop();
    }
}

impl std::ops::Deref for IndentGuard<'_> {
    type Target = IndentHandler;
    fn deref(&self) -> &IndentHandler {
        self.handler
    }
}

impl std::ops::DerefMut for IndentGuard<'_> {
    fn deref_mut(&mut self) -> &mut IndentHandler {
        self.handler
    }
}
