/// Queue of events tagged with the tick they were raised in.
///
/// Producers `emit` while they run; the owner drains the queue once per
/// tick. Delivery order is emission order, which gives consumers a
/// non-decreasing time order for free.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<E> {
    pub tick: u64,
    pub event: E,
}

#[derive(Debug)]
pub struct EventBus<E> {
    tick: u64,
    events: Vec<Tagged<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            tick: 0,
            events: Vec::new(),
        }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tick recorded on subsequently emitted events.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn emit(&mut self, event: E) {
        self.events.push(Tagged {
            tick: self.tick,
            event,
        });
    }

    pub fn events(&self) -> &[Tagged<E>] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Tagged<E>> {
        std::mem::take(&mut self.events)
    }

    /// Drains the queue, dropping the tick tags.
    pub fn drain_events(&mut self) -> impl Iterator<Item = E> + use<E> {
        std::mem::take(&mut self.events).into_iter().map(|t| t.event)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn records_events_with_tick() {
        let mut bus = EventBus::new();
        bus.set_tick(2);
        bus.emit("hello");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].tick, 2);
    }

    #[test]
    fn drain_clears_events_in_emission_order() {
        let mut bus = EventBus::new();
        bus.emit(1);
        bus.emit(2);
        let drained: Vec<i32> = bus.drain_events().collect();
        assert_eq!(drained, vec![1, 2]);
        assert!(bus.is_empty());
    }
}
