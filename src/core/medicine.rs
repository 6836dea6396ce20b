//! Medicine business logic - The products manufacturers make batches of.

use crate::{
    core::party,
    entities::{Medicine, medicine, party::PartyRole},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Registers a medicine for a manufacturer.
///
/// The manufacturer must exist and hold the manufacturer role.
#[instrument(skip(db))]
pub async fn create_medicine<C>(
    db: &C,
    manufacturer_id: i64,
    name: &str,
    generic_name: Option<String>,
    description: Option<String>,
) -> Result<medicine::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Medicine name cannot be empty"));
    }

    let manufacturer = party::require_party(db, manufacturer_id).await?;
    if manufacturer.role != PartyRole::Manufacturer {
        return Err(Error::validation(format!(
            "Party {} is a {}, not a manufacturer",
            manufacturer.name, manufacturer.role
        )));
    }

    let medicine = medicine::ActiveModel {
        name: Set(name.to_string()),
        generic_name: Set(generic_name),
        manufacturer_id: Set(manufacturer_id),
        description: Set(description),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Registered medicine '{}' for {}", medicine.name, manufacturer.name);
    Ok(medicine)
}

/// Finds a medicine by id, failing with `NotFound` if it does not exist.
pub async fn require_medicine<C>(db: &C, medicine_id: i64) -> Result<medicine::Model>
where
    C: ConnectionTrait,
{
    Medicine::find_by_id(medicine_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Medicine", medicine_id))
}

/// Finds a manufacturer's medicine by name.
pub async fn get_medicine_by_name<C>(
    db: &C,
    manufacturer_id: i64,
    name: &str,
) -> Result<Option<medicine::Model>>
where
    C: ConnectionTrait,
{
    Medicine::find()
        .filter(medicine::Column::ManufacturerId.eq(manufacturer_id))
        .filter(medicine::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists a manufacturer's medicines alphabetically.
pub async fn list_medicines_for_manufacturer<C>(
    db: &C,
    manufacturer_id: i64,
) -> Result<Vec<medicine::Model>>
where
    C: ConnectionTrait,
{
    Medicine::find()
        .filter(medicine::Column::ManufacturerId.eq(manufacturer_id))
        .order_by_asc(medicine::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_medicine_requires_manufacturer() -> Result<()> {
        let db = setup_test_db().await?;
        let retailer = create_test_party(&db, "Corner Chemist", PartyRole::Retailer).await?;

        let result = create_medicine(&db, retailer.id, "Paracetamol 500", None, None).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_medicine(&db, 999, "Paracetamol 500", None, None).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_list_medicines() -> Result<()> {
        let db = setup_test_db().await?;
        let maker = create_test_party(&db, "Acme Pharma", PartyRole::Manufacturer).await?;

        create_medicine(&db, maker.id, "Zincovit", None, None).await?;
        let para = create_medicine(
            &db,
            maker.id,
            "Calpol",
            Some("Paracetamol".to_string()),
            None,
        )
        .await?;

        let found = get_medicine_by_name(&db, maker.id, "Calpol").await?.unwrap();
        assert_eq!(found, para);

        let listed = list_medicines_for_manufacturer(&db, maker.id).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Calpol");

        Ok(())
    }
}
