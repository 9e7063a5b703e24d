/// Handle for a pending subscription, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnOnce(&T) + Send>;

/// One-shot listeners for the next occurrence of an event.
pub struct Subscriptions<T: ?Sized> {
  next_id: u64,
  pending: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T: ?Sized> Default for Subscriptions<T> {
  fn default() -> Self {
    Self {
      next_id: 0,
      pending: Vec::new(),
    }
  }
}

impl<T: ?Sized> Subscriptions<T> {
  pub fn subscribe_once(&mut self, callback: impl FnOnce(&T) + Send + 'static) -> SubscriptionId {
    let id = SubscriptionId(self.next_id);
    self.next_id += 1;
    self.pending.push((id, Box::new(callback)));
    id
  }

  /// Returns false if the subscription already fired or was cancelled.
  pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    let before = self.pending.len();
    self.pending.retain(|(pending, _)| *pending != id);
    self.pending.len() != before
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }

  /// Calls and removes every pending subscription.
  pub fn fire(&mut self, value: &T) {
    for (_, callback) in std::mem::take(&mut self.pending) {
      callback(value);
    }
  }
}
