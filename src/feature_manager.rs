//! Keeps a queryable vector feature store in step with the selected map layer.

mod schema;
mod subscription;
mod visibility;

pub use schema::{AttributeDef, Field, FieldType, Schema, field_type};
pub use subscription::{SubscriptionId, Subscriptions};
pub use visibility::LayerVisibility;

use anyhow::Result;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A map layer the user can select.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerRecord {
  pub name: String,
  /// Id of the source that serves the layer, if it has one.
  pub source: Option<String>,
}

/// Filter expression passed through to the feature source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
  pub id: Option<String>,
  pub attributes: Map<String, Value>,
}

/// Everything needed to query features for a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDescriptor {
  pub url: String,
  pub feature_type: String,
  pub feature_ns: String,
  pub srs_name: String,
  pub max_features: usize,
  pub fields: Vec<Field>,
}

/// Features loaded for the selected layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStore {
  descriptor: StoreDescriptor,
  filter: Option<QueryFilter>,
  features: Vec<Feature>,
}

impl FeatureStore {
  #[must_use]
  pub fn descriptor(&self) -> &StoreDescriptor {
    &self.descriptor
  }

  #[must_use]
  pub fn filter(&self) -> Option<&QueryFilter> {
    self.filter.as_ref()
  }

  #[must_use]
  pub fn features(&self) -> &[Feature] {
    &self.features
  }
}

/// Where schemas and features come from. Implemented by the host.
#[async_trait::async_trait]
pub trait FeatureSource: Send + Sync {
  /// `None` if the layer has no feature type behind it.
  async fn schema(&self, layer: &LayerRecord) -> Result<Option<Schema>>;

  async fn fetch(
    &self,
    store: &StoreDescriptor,
    filter: Option<&QueryFilter>,
  ) -> Result<Vec<Feature>>;
}

/// Observes the manager. The `before_*` hooks can veto by returning false.
pub trait FeatureListener: Send {
  fn before_query(&mut self, _filter: Option<&QueryFilter>) -> bool {
    true
  }
  fn before_layer_change(&mut self, _layer: Option<&LayerRecord>) -> bool {
    true
  }
  fn on_query(&mut self, _store: &FeatureStore) {}
  fn on_layer_change(&mut self, _layer: Option<&LayerRecord>, _schema: Option<&Schema>) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureManagerConfig {
  pub max_features: usize,
  /// Query right after a layer was selected instead of only building the store.
  pub auto_load_features: bool,
  pub srs_name: String,
}

impl Default for FeatureManagerConfig {
  fn default() -> Self {
    Self {
      max_features: 100,
      auto_load_features: false,
      srs_name: "EPSG:4326".to_string(),
    }
  }
}

pub struct FeatureManager {
  config: FeatureManagerConfig,
  source: Box<dyn FeatureSource>,
  selected_layer: Option<LayerRecord>,
  store: Option<FeatureStore>,
  visibility: LayerVisibility,
  listeners: Vec<Box<dyn FeatureListener>>,
  query_subscriptions: Subscriptions<[Feature]>,
}

impl FeatureManager {
  #[must_use]
  pub fn new(config: FeatureManagerConfig, source: Box<dyn FeatureSource>) -> Self {
    Self {
      config,
      source,
      selected_layer: None,
      store: None,
      visibility: LayerVisibility::new(),
      listeners: Vec::new(),
      query_subscriptions: Subscriptions::default(),
    }
  }

  pub fn add_listener(&mut self, listener: Box<dyn FeatureListener>) {
    self.listeners.push(listener);
  }

  #[must_use]
  pub fn selected_layer(&self) -> Option<&LayerRecord> {
    self.selected_layer.as_ref()
  }

  #[must_use]
  pub fn store(&self) -> Option<&FeatureStore> {
    self.store.as_ref()
  }

  /// Whether the feature layer should currently be on the map.
  #[must_use]
  pub fn layer_visible(&self) -> bool {
    self.visibility.is_visible()
  }

  pub fn show_layer(&mut self, tool_id: &str) -> bool {
    self.visibility.show(tool_id)
  }

  pub fn hide_layer(&mut self, tool_id: &str) -> bool {
    self.visibility.hide(tool_id)
  }

  /// Runs `callback` with the features of the next completed query.
  pub fn subscribe_query_once(
    &mut self,
    callback: impl FnOnce(&[Feature]) + Send + 'static,
  ) -> SubscriptionId {
    self.query_subscriptions.subscribe_once(callback)
  }

  pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    self.query_subscriptions.unsubscribe(id)
  }

  /// Selects a layer and rebuilds the store for it.
  /// Returns false if a listener vetoed the change.
  pub async fn set_layer(&mut self, layer: Option<LayerRecord>) -> Result<bool> {
    if !self
      .listeners
      .iter_mut()
      .all(|l| l.before_layer_change(layer.as_ref()))
    {
      return Ok(false);
    }
    if layer == self.selected_layer {
      return Ok(true);
    }

    self.clear_feature_store();
    self.selected_layer = layer;
    if self.selected_layer.is_some() {
      if self.config.auto_load_features {
        self.load_features(None).await?;
      } else {
        self.set_feature_store(None, false).await?;
      }
    }
    Ok(true)
  }

  /// Queries features of the selected layer. Returns false if vetoed.
  pub async fn load_features(&mut self, filter: Option<QueryFilter>) -> Result<bool> {
    if !self
      .listeners
      .iter_mut()
      .all(|l| l.before_query(filter.as_ref()))
    {
      return Ok(false);
    }

    match self.store.as_mut() {
      None => self.set_feature_store(filter, true).await?,
      Some(store) => {
        store.filter = filter;
        self.query().await?;
      }
    }
    Ok(true)
  }

  /// Drops the store and its features.
  pub fn clear_feature_store(&mut self) {
    if let Some(store) = self.store.take() {
      debug!(
        "Dropping feature store for {} with {} features",
        store.descriptor.feature_type,
        store.features.len()
      );
    }
  }

  async fn set_feature_store(&mut self, filter: Option<QueryFilter>, auto_load: bool) -> Result<()> {
    let Some(layer) = self.selected_layer.clone() else {
      return Ok(());
    };

    let schema = if layer.source.is_some() {
      self
        .source
        .schema(&layer)
        .await
        .inspect_err(|e| error!("Failed to read schema of {}: {e:#}", layer.name))
        .ok()
        .flatten()
    } else {
      None
    };

    match &schema {
      None => self.clear_feature_store(),
      Some(schema) => {
        self.store = Some(FeatureStore {
          descriptor: StoreDescriptor {
            url: schema.url.clone(),
            feature_type: schema.feature_type.clone(),
            feature_ns: schema.feature_ns.clone(),
            srs_name: self.config.srs_name.clone(),
            max_features: self.config.max_features,
            fields: schema.fields(),
          },
          filter,
          features: Vec::new(),
        });
      }
    }

    for listener in &mut self.listeners {
      listener.on_layer_change(Some(&layer), schema.as_ref());
    }

    if auto_load && self.store.is_some() {
      self.query().await?;
    }
    Ok(())
  }

  async fn query(&mut self) -> Result<()> {
    let Some(store) = self.store.as_mut() else {
      return Ok(());
    };
    let mut features = self
      .source
      .fetch(&store.descriptor, store.filter.as_ref())
      .await?;
    features.truncate(store.descriptor.max_features);
    store.features = features;

    for listener in &mut self.listeners {
      listener.on_query(store);
    }
    if !self.query_subscriptions.is_empty() {
      debug!("Completing query subscriptions for {}", store.descriptor.feature_type);
      self.query_subscriptions.fire(&store.features[..]);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, Mutex};

  struct StaticSource {
    features: usize,
  }

  #[async_trait::async_trait]
  impl FeatureSource for StaticSource {
    async fn schema(&self, layer: &LayerRecord) -> Result<Option<Schema>> {
      if layer.name == "broken" {
        anyhow::bail!("no capabilities");
      }
      Ok(Some(Schema {
        url: "http://example.com/wfs".into(),
        feature_type: layer.name.clone(),
        feature_ns: "http://example.com/ns".into(),
        attributes: vec![AttributeDef {
          name: "when".into(),
          xsd_type: "xsd:date".into(),
        }],
      }))
    }

    async fn fetch(
      &self,
      store: &StoreDescriptor,
      filter: Option<&QueryFilter>,
    ) -> Result<Vec<Feature>> {
      Ok(
        (0..self.features)
          .map(|i| Feature {
            id: Some(format!("{}.{i}", store.feature_type)),
            attributes: filter
              .map(|f| Map::from_iter([("filter".to_string(), Value::String(f.0.clone()))]))
              .unwrap_or_default(),
          })
          .collect(),
      )
    }
  }

  #[derive(Default)]
  struct Events(Arc<Mutex<Vec<String>>>);

  impl FeatureListener for Events {
    fn before_query(&mut self, filter: Option<&QueryFilter>) -> bool {
      filter.is_none_or(|f| f.0 != "forbidden")
    }
    fn on_query(&mut self, store: &FeatureStore) {
      self
        .0
        .lock()
        .unwrap()
        .push(format!("query {}", store.features().len()));
    }
    fn on_layer_change(&mut self, layer: Option<&LayerRecord>, schema: Option<&Schema>) {
      self.0.lock().unwrap().push(format!(
        "layer {} {}",
        layer.map_or("-", |l| l.name.as_str()),
        schema.is_some()
      ));
    }
  }

  fn layer(name: &str) -> LayerRecord {
    LayerRecord {
      name: name.into(),
      source: Some("local".into()),
    }
  }

  fn manager(config: FeatureManagerConfig, features: usize) -> (FeatureManager, Arc<Mutex<Vec<String>>>) {
    let mut manager = FeatureManager::new(config, Box::new(StaticSource { features }));
    let events = Events::default();
    let log = events.0.clone();
    manager.add_listener(Box::new(events));
    (manager, log)
  }

  #[tokio::test]
  async fn selecting_builds_store_without_loading() {
    let (mut manager, log) = manager(FeatureManagerConfig::default(), 3);
    assert!(manager.set_layer(Some(layer("roads"))).await.unwrap());
    let store = manager.store().unwrap();
    assert!(store.features().is_empty());
    assert_eq!(store.descriptor().fields[0].field_type, Some(FieldType::Date));
    assert_eq!(log.lock().unwrap().as_slice(), ["layer roads true"]);
  }

  #[tokio::test]
  async fn auto_load_respects_max_features() {
    let config = FeatureManagerConfig {
      max_features: 2,
      auto_load_features: true,
      ..FeatureManagerConfig::default()
    };
    let (mut manager, log) = manager(config, 5);
    manager.set_layer(Some(layer("rivers"))).await.unwrap();
    assert_eq!(manager.store().unwrap().features().len(), 2);
    assert_eq!(log.lock().unwrap().as_slice(), ["layer rivers true", "query 2"]);
  }

  #[tokio::test]
  async fn query_subscription_fires_once() {
    let (mut manager, _) = manager(FeatureManagerConfig::default(), 1);
    manager.set_layer(Some(layer("roads"))).await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    manager.subscribe_query_once(move |features| sink.lock().unwrap().push(features.len()));
    let cancelled = manager.subscribe_query_once(|_| panic!("cancelled subscription ran"));
    assert!(manager.unsubscribe(cancelled));

    manager
      .load_features(Some(QueryFilter("name = 'A1'".into())))
      .await
      .unwrap();
    manager.load_features(None).await.unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), [1]);
    assert!(manager.store().unwrap().filter().is_none());
  }

  #[tokio::test]
  async fn vetoed_query_does_nothing() {
    let (mut manager, log) = manager(FeatureManagerConfig::default(), 1);
    manager.set_layer(Some(layer("roads"))).await.unwrap();
    assert!(
      !manager
        .load_features(Some(QueryFilter("forbidden".into())))
        .await
        .unwrap()
    );
    assert_eq!(log.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn layers_without_schema_clear_the_store() {
    let (mut manager, log) = manager(FeatureManagerConfig::default(), 1);
    manager.set_layer(Some(layer("roads"))).await.unwrap();
    manager.set_layer(Some(layer("broken"))).await.unwrap();
    assert!(manager.store().is_none());

    let plain = LayerRecord {
      name: "basemap".into(),
      source: None,
    };
    manager.set_layer(Some(plain)).await.unwrap();
    assert!(manager.store().is_none());
    assert_eq!(
      log.lock().unwrap().as_slice(),
      ["layer roads true", "layer broken false", "layer basemap false"]
    );

    manager.set_layer(None).await.unwrap();
    assert!(manager.selected_layer().is_none());
  }

  #[test]
  fn visibility_is_owned_by_the_manager() {
    let (mut manager, _) = manager(FeatureManagerConfig::default(), 0);
    assert!(manager.show_layer("editor"));
    assert!(manager.layer_visible());
    assert!(manager.hide_layer("editor"));
    assert!(!manager.layer_visible());
  }
}
