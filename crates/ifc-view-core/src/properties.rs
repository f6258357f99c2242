// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property resolution for picked elements and the spatial tree

use crate::error::{Result, ViewerError};
use futures_util::try_join;
use ifc_view_model::{ElementProperties, ExpressId, IfcManager, ModelId, SpatialTree};
use std::rc::Rc;

/// Read-only queries against the library; every call is repeatable
pub struct PropertyResolver<M> {
    manager: Rc<M>,
}

impl<M: IfcManager> PropertyResolver<M> {
    pub fn new(manager: Rc<M>) -> Self {
        Self { manager }
    }

    /// Native attributes, property sets, type properties and materials of one
    /// element, all resolved recursively
    ///
    /// The four queries run concurrently; the first failure fails the call.
    pub async fn element_properties(
        &self,
        model: ModelId,
        element: ExpressId,
    ) -> Result<ElementProperties> {
        let manager = &self.manager;
        let (native, property_sets, type_properties, materials) = try_join!(
            manager.item_properties(model, element, true),
            manager.property_sets(model, element, true),
            manager.type_properties(model, element, true),
            manager.material_properties(model, element, true),
        )
        .map_err(|source| ViewerError::PropertyResolution {
            model,
            element,
            source,
        })?;

        log::debug!(
            "[Properties] {} in {}: {} property sets, {} types, {} materials",
            element,
            model,
            property_sets.len(),
            type_properties.len(),
            materials.len()
        );
        Ok(ElementProperties {
            model_id: model,
            express_id: element,
            native,
            property_sets,
            type_properties,
            materials,
        })
    }

    /// Full spatial hierarchy of `model`
    pub async fn spatial_structure(&self, model: ModelId) -> Result<SpatialTree> {
        let root = self
            .manager
            .spatial_structure(model, true)
            .await
            .map_err(|source| ViewerError::SpatialStructure { model, source })?;
        Ok(SpatialTree::new(root))
    }
}
