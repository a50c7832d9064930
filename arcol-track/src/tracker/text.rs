// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;

use crate::tracker::{Mark, Registry, Track};
use crate::{Id, Writer};

/// Writes one line of text per event, naming entities by their full path.
///
/// ```text
/// @12.0ns top::node1::router DEBUG: east arrival: Bcast Float x2 root=0 dest=3
/// @12.0ns top::node1::router enter 41
/// ```
pub struct TextTracker {
    registry: Registry,
    writer: RefCell<Writer>,
}

impl TextTracker {
    /// Report entities known to `registry` to `writer`.
    #[must_use]
    pub fn new(registry: Registry, writer: Writer) -> Self {
        Self {
            registry,
            writer: RefCell::new(writer),
        }
    }

    fn line(&self, id: Id, body: fmt::Arguments) {
        let now = self.registry.now_ns();
        let name = self.registry.name_of(id);
        let _ = writeln!(self.writer.borrow_mut(), "@{now:.1}ns {name} {body}");
    }
}

impl Track for TextTracker {
    fn unique_id(&self) -> Id {
        self.registry.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.registry.enabled(id, level)
    }

    fn add_entity(&self, id: Id, parent: Id, full_name: &str) {
        self.registry.add_entity(id, full_name);
        if self.registry.enabled(id, log::Level::Trace) {
            let parent = self.registry.name_of(parent);
            self.line(id, format_args!("created by {parent}"));
        }
    }

    fn mark(&self, id: Id, mark: Mark) {
        match mark {
            Mark::Connect(to) => {
                let to = self.registry.name_of(to);
                self.line(id, format_args!("connect {to}"));
            }
            _ => self.line(id, format_args!("{mark}")),
        }
    }

    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments) {
        self.line(id, format_args!("{level}: {msg}"));
    }

    fn time(&self, _set_by: Id, time_ns: f64) {
        self.registry.advance(time_ns);
    }

    fn shutdown(&self) {
        let _ = self.writer.borrow_mut().flush();
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            io::Write::write(&mut *self.0.borrow_mut(), buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lines_use_names_and_time() {
        let out = Shared::default();
        let tracker = TextTracker::new(Registry::new(log::Level::Trace), Box::new(out.clone()));
        let top = tracker.unique_id();
        tracker.add_entity(top, crate::NO_ID, "top");
        let link = tracker.unique_id();
        tracker.add_entity(link, top, "top::east_link");

        tracker.time(top, 3.0);
        tracker.mark(link, Mark::Connect(top));
        tracker.log(link, log::Level::Warn, format_args!("{} words queued", 2));
        tracker.mark(link, Mark::Enter(Id(40)));

        let text = String::from_utf8(out.0.borrow().clone()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "@0.0ns top created by -",
                "@0.0ns top::east_link created by top",
                "@3.0ns top::east_link connect top",
                "@3.0ns top::east_link WARN: 2 words queued",
                "@3.0ns top::east_link enter 40",
            ]
        );
    }
}
