use std::collections::HashMap;

use gudang_core::{AggregateId, DomainError, DomainResult};

use crate::brand::{Brand, BrandId};
use crate::item::{Item, ItemId, ItemPatch, NewItem};
use crate::supplier::{Supplier, SupplierContact, SupplierId, SupplierPatch};
use crate::unit::{Unit, UnitId};

/// In-memory catalog state: brands, units, suppliers and the items that
/// reference them.
///
/// All mutations validate their inputs and referential integrity before
/// touching state; a returned error leaves the registry unchanged.
#[derive(Debug, Default)]
pub struct CatalogRegistry {
    brands: HashMap<BrandId, Brand>,
    units: HashMap<UnitId, Unit>,
    suppliers: HashMap<SupplierId, Supplier>,
    items: HashMap<ItemId, Item>,
}

fn validated_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- brands ---------------------------------------------------------

    pub fn create_brand(&mut self, name: &str) -> DomainResult<Brand> {
        let brand = Brand {
            id: BrandId::new(AggregateId::new()),
            name: validated_name(name)?,
        };
        self.brands.insert(brand.id, brand.clone());
        Ok(brand)
    }

    pub fn update_brand(&mut self, id: BrandId, name: &str) -> DomainResult<Brand> {
        let name = validated_name(name)?;
        let brand = self.brands.get_mut(&id).ok_or(DomainError::NotFound)?;
        brand.name = name;
        Ok(brand.clone())
    }

    /// Rejected while any item still references the brand.
    pub fn delete_brand(&mut self, id: BrandId) -> DomainResult<()> {
        if !self.brands.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if self.items.values().any(|i| i.brand_id == id) {
            return Err(DomainError::conflict("brand is referenced by an item"));
        }
        self.brands.remove(&id);
        Ok(())
    }

    pub fn get_brand(&self, id: BrandId) -> Option<&Brand> {
        self.brands.get(&id)
    }

    pub fn list_brands(&self) -> Vec<Brand> {
        let mut all: Vec<_> = self.brands.values().cloned().collect();
        all.sort_by_key(|b| *b.id.0.as_uuid());
        all
    }

    // ----- units ----------------------------------------------------------

    pub fn create_unit(&mut self, name: &str) -> DomainResult<Unit> {
        let unit = Unit {
            id: UnitId::new(AggregateId::new()),
            name: validated_name(name)?,
        };
        self.units.insert(unit.id, unit.clone());
        Ok(unit)
    }

    pub fn update_unit(&mut self, id: UnitId, name: &str) -> DomainResult<Unit> {
        let name = validated_name(name)?;
        let unit = self.units.get_mut(&id).ok_or(DomainError::NotFound)?;
        unit.name = name;
        Ok(unit.clone())
    }

    /// Rejected while any item still references the unit.
    pub fn delete_unit(&mut self, id: UnitId) -> DomainResult<()> {
        if !self.units.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if self.items.values().any(|i| i.unit_id == id) {
            return Err(DomainError::conflict("unit is referenced by an item"));
        }
        self.units.remove(&id);
        Ok(())
    }

    pub fn get_unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn list_units(&self) -> Vec<Unit> {
        let mut all: Vec<_> = self.units.values().cloned().collect();
        all.sort_by_key(|u| *u.id.0.as_uuid());
        all
    }

    // ----- suppliers ------------------------------------------------------

    pub fn create_supplier(
        &mut self,
        name: &str,
        contact: SupplierContact,
    ) -> DomainResult<Supplier> {
        let supplier = Supplier {
            id: SupplierId::new(AggregateId::new()),
            name: validated_name(name)?,
            contact,
        };
        self.suppliers.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }

    pub fn update_supplier(&mut self, id: SupplierId, patch: SupplierPatch) -> DomainResult<Supplier> {
        let name = match patch.name {
            Some(name) => Some(validated_name(&name)?),
            None => None,
        };
        let supplier = self.suppliers.get_mut(&id).ok_or(DomainError::NotFound)?;
        if let Some(name) = name {
            supplier.name = name;
        }
        if let Some(contact) = patch.contact {
            supplier.contact = contact;
        }
        Ok(supplier.clone())
    }

    /// Rejected while any item still references the supplier.
    pub fn delete_supplier(&mut self, id: SupplierId) -> DomainResult<()> {
        if !self.suppliers.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if self.items.values().any(|i| i.supplier_id == Some(id)) {
            return Err(DomainError::conflict("supplier is referenced by an item"));
        }
        self.suppliers.remove(&id);
        Ok(())
    }

    pub fn get_supplier(&self, id: SupplierId) -> Option<&Supplier> {
        self.suppliers.get(&id)
    }

    pub fn list_suppliers(&self) -> Vec<Supplier> {
        let mut all: Vec<_> = self.suppliers.values().cloned().collect();
        all.sort_by_key(|s| *s.id.0.as_uuid());
        all
    }

    // ----- items ----------------------------------------------------------

    fn ensure_references(
        &self,
        brand_id: BrandId,
        unit_id: UnitId,
        supplier_id: Option<SupplierId>,
    ) -> DomainResult<()> {
        if !self.brands.contains_key(&brand_id) {
            return Err(DomainError::validation(format!(
                "brand {brand_id} does not exist"
            )));
        }
        if !self.units.contains_key(&unit_id) {
            return Err(DomainError::validation(format!(
                "unit {unit_id} does not exist"
            )));
        }
        if let Some(supplier_id) = supplier_id {
            if !self.suppliers.contains_key(&supplier_id) {
                return Err(DomainError::validation(format!(
                    "supplier {supplier_id} does not exist"
                )));
            }
        }
        Ok(())
    }

    pub fn create_item(&mut self, new: NewItem) -> DomainResult<Item> {
        let name = validated_name(&new.name)?;
        self.ensure_references(new.brand_id, new.unit_id, new.supplier_id)?;

        let item = Item {
            id: ItemId::new(AggregateId::new()),
            name,
            brand_id: new.brand_id,
            unit_id: new.unit_id,
            supplier_id: new.supplier_id,
        };
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    /// Merge the provided fields into the item (partial update).
    pub fn update_item(&mut self, id: ItemId, patch: ItemPatch) -> DomainResult<Item> {
        let current = self.items.get(&id).ok_or(DomainError::NotFound)?.clone();

        let name = match patch.name {
            Some(name) => validated_name(&name)?,
            None => current.name,
        };
        let brand_id = patch.brand_id.unwrap_or(current.brand_id);
        let unit_id = patch.unit_id.unwrap_or(current.unit_id);
        let supplier_id = patch.supplier_id.unwrap_or(current.supplier_id);

        self.ensure_references(brand_id, unit_id, supplier_id)?;

        let updated = Item {
            id,
            name,
            brand_id,
            unit_id,
            supplier_id,
        };
        self.items.insert(id, updated.clone());
        Ok(updated)
    }

    /// Remove an item.
    ///
    /// The "item has recorded movements" guard lives in the service facade;
    /// this only checks the item exists.
    pub fn delete_item(&mut self, id: ItemId) -> DomainResult<()> {
        if self.items.remove(&id).is_none() {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn list_items(&self) -> Vec<Item> {
        let mut all: Vec<_> = self.items.values().cloned().collect();
        all.sort_by_key(|i| *i.id.0.as_uuid());
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_refs() -> (CatalogRegistry, BrandId, UnitId, SupplierId) {
        let mut registry = CatalogRegistry::new();
        let brand = registry.create_brand("Acme").unwrap();
        let unit = registry.create_unit("box").unwrap();
        let supplier = registry
            .create_supplier("PT Sumber Makmur", SupplierContact::default())
            .unwrap();
        (registry, brand.id, unit.id, supplier.id)
    }

    #[test]
    fn create_item_stores_trimmed_name_and_references() {
        let (mut registry, brand_id, unit_id, supplier_id) = registry_with_refs();

        let item = registry
            .create_item(NewItem {
                name: "  Stapler  ".to_string(),
                brand_id,
                unit_id,
                supplier_id: Some(supplier_id),
            })
            .unwrap();

        assert_eq!(item.name, "Stapler");
        assert_eq!(item.brand_id, brand_id);
        assert_eq!(registry.get_item(item.id), Some(&item));
    }

    #[test]
    fn create_item_rejects_empty_name() {
        let (mut registry, brand_id, unit_id, _) = registry_with_refs();

        let err = registry
            .create_item(NewItem {
                name: "   ".to_string(),
                brand_id,
                unit_id,
                supplier_id: None,
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_item_rejects_dangling_brand() {
        let (mut registry, _, unit_id, _) = registry_with_refs();
        let dangling = BrandId::new(AggregateId::new());

        let err = registry
            .create_item(NewItem {
                name: "Stapler".to_string(),
                brand_id: dangling,
                unit_id,
                supplier_id: None,
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_item_merges_only_provided_fields() {
        let (mut registry, brand_id, unit_id, supplier_id) = registry_with_refs();
        let item = registry
            .create_item(NewItem {
                name: "Stapler".to_string(),
                brand_id,
                unit_id,
                supplier_id: Some(supplier_id),
            })
            .unwrap();

        let updated = registry
            .update_item(
                item.id,
                ItemPatch {
                    name: Some("Heavy-duty stapler".to_string()),
                    ..ItemPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Heavy-duty stapler");
        assert_eq!(updated.brand_id, brand_id);
        assert_eq!(updated.supplier_id, Some(supplier_id));
    }

    #[test]
    fn update_item_can_clear_supplier() {
        let (mut registry, brand_id, unit_id, supplier_id) = registry_with_refs();
        let item = registry
            .create_item(NewItem {
                name: "Stapler".to_string(),
                brand_id,
                unit_id,
                supplier_id: Some(supplier_id),
            })
            .unwrap();

        let updated = registry
            .update_item(
                item.id,
                ItemPatch {
                    supplier_id: Some(None),
                    ..ItemPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.supplier_id, None);
        registry.delete_supplier(supplier_id).unwrap();
    }

    #[test]
    fn update_item_rejects_unknown_id() {
        let (mut registry, _, _, _) = registry_with_refs();
        let err = registry
            .update_item(ItemId::new(AggregateId::new()), ItemPatch::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn update_item_rejects_dangling_new_reference() {
        let (mut registry, brand_id, unit_id, _) = registry_with_refs();
        let item = registry
            .create_item(NewItem {
                name: "Stapler".to_string(),
                brand_id,
                unit_id,
                supplier_id: None,
            })
            .unwrap();

        let err = registry
            .update_item(
                item.id,
                ItemPatch {
                    unit_id: Some(UnitId::new(AggregateId::new())),
                    ..ItemPatch::default()
                },
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        // Failed update leaves the item untouched.
        assert_eq!(registry.get_item(item.id).unwrap().unit_id, unit_id);
    }

    #[test]
    fn delete_brand_rejected_while_referenced() {
        let (mut registry, brand_id, unit_id, _) = registry_with_refs();
        let item = registry
            .create_item(NewItem {
                name: "Stapler".to_string(),
                brand_id,
                unit_id,
                supplier_id: None,
            })
            .unwrap();

        let err = registry.delete_brand(brand_id).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        registry.delete_item(item.id).unwrap();
        registry.delete_brand(brand_id).unwrap();
        assert!(registry.get_brand(brand_id).is_none());
    }

    #[test]
    fn delete_unit_and_supplier_rejected_while_referenced() {
        let (mut registry, brand_id, unit_id, supplier_id) = registry_with_refs();
        registry
            .create_item(NewItem {
                name: "Stapler".to_string(),
                brand_id,
                unit_id,
                supplier_id: Some(supplier_id),
            })
            .unwrap();

        assert!(matches!(
            registry.delete_unit(unit_id).unwrap_err(),
            DomainError::Conflict(_)
        ));
        assert!(matches!(
            registry.delete_supplier(supplier_id).unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[test]
    fn delete_missing_records_report_not_found() {
        let mut registry = CatalogRegistry::new();
        assert!(matches!(
            registry.delete_brand(BrandId::new(AggregateId::new())),
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            registry.delete_item(ItemId::new(AggregateId::new())),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn update_supplier_merges_contact() {
        let (mut registry, _, _, supplier_id) = registry_with_refs();

        let updated = registry
            .update_supplier(
                supplier_id,
                SupplierPatch {
                    contact: Some(SupplierContact {
                        address: Some("Jl. Padang No. 5".to_string()),
                        phone: Some("+62 751 123456".to_string()),
                    }),
                    ..SupplierPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "PT Sumber Makmur");
        assert_eq!(updated.contact.address.as_deref(), Some("Jl. Padang No. 5"));
    }

    #[test]
    fn list_items_is_stable_by_creation_order() {
        let (mut registry, brand_id, unit_id, _) = registry_with_refs();
        let first = registry
            .create_item(NewItem {
                name: "First".to_string(),
                brand_id,
                unit_id,
                supplier_id: None,
            })
            .unwrap();
        let second = registry
            .create_item(NewItem {
                name: "Second".to_string(),
                brand_id,
                unit_id,
                supplier_id: None,
            })
            .unwrap();

        let listed: Vec<_> = registry.list_items().into_iter().map(|i| i.id).collect();
        assert_eq!(listed, vec![first.id, second.id]);
    }
}
