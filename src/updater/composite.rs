use std::{collections::HashMap, sync::Arc};

use crate::{
    error::Result,
    updater::traits::{Update, Updater},
};

/// Applies several updaters to the same file, in order.
#[derive(Debug, Clone)]
pub struct CompositeUpdater {
    updaters: Vec<Arc<dyn Updater>>,
}

impl CompositeUpdater {
    pub fn new(updaters: Vec<Arc<dyn Updater>>) -> Self {
        Self { updaters }
    }

    pub fn len(&self) -> usize {
        self.updaters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updaters.is_empty()
    }
}

impl Updater for CompositeUpdater {
    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let mut current = content.map(|c| c.to_string());

        for updater in self.updaters.iter() {
            current = Some(updater.update_content(current.as_deref())?);
        }

        Ok(current.unwrap_or_default())
    }
}

/// Collapses updates targeting the same path into one [`CompositeUpdater`].
///
/// Output keeps the position of each path's first occurrence; within a path
/// the updaters run in input order. `create_if_missing` is true when any of
/// the merged updates allowed creation.
pub fn merge_updates(updates: Vec<Update>) -> Vec<Update> {
    let mut order: Vec<String> = vec![];
    let mut by_path: HashMap<String, Vec<Update>> = HashMap::new();

    for update in updates {
        if !by_path.contains_key(&update.path) {
            order.push(update.path.clone());
        }
        by_path.entry(update.path.clone()).or_default().push(update);
    }

    order
        .into_iter()
        .filter_map(|path| {
            let mut group = by_path.remove(&path)?;

            if group.len() == 1 {
                return group.pop();
            }

            let create_if_missing = group.iter().any(|u| u.create_if_missing);
            let updaters = group.into_iter().map(|u| u.updater).collect();

            Some(Update {
                path,
                create_if_missing,
                updater: Arc::new(CompositeUpdater::new(updaters)),
            })
        })
        .collect()
}
