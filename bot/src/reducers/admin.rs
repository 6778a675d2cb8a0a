//! Admin catalog sub-flow: product creation and restocking.
//!
//! Each step parses one field and moves on; the last step hands a complete
//! record to the shell and returns the session to `Start`.

use super::{Effects, reject};
use crate::effects::ChatEffect;
use crate::environment::WorkflowEnvironment;
use crate::prompts;
use crate::session::{AdminStage, Session, Stage};
use crate::types::{NewProduct, ProductId};
use crate::validation::{self, ValidationError};
use courier_core::smallvec;

/// Placeholder typed at the image step to skip the photo.
const SKIP_IMAGE: &str = "-";

pub(super) fn begin_creation(session: &mut Session, env: &WorkflowEnvironment) -> Effects {
    if !env.is_admin(session.user_id) {
        tracing::warn!(user_id = %session.user_id, "Non-admin attempted product creation");
        return reject(session, &ValidationError::NotPermitted);
    }

    session.stage = Stage::Admin(AdminStage::ProductName);
    smallvec![ChatEffect::prompt(prompts::ADMIN_ENTER_NAME)]
}

pub(super) fn begin_stock_update(session: &mut Session, product_id: ProductId, env: &WorkflowEnvironment) -> Effects {
    if !env.is_admin(session.user_id) {
        tracing::warn!(user_id = %session.user_id, "Non-admin attempted stock update");
        return reject(session, &ValidationError::NotPermitted);
    }

    let Some(product) = env.catalog.find(product_id) else {
        return reject(session, &ValidationError::UnknownProduct);
    };

    session.stage = Stage::Admin(AdminStage::UpdatingStock { product_id });
    smallvec![ChatEffect::prompt(prompts::admin_enter_new_stock(product))]
}

pub(super) fn on_text(session: &mut Session, text: &str) -> Effects {
    let Stage::Admin(stage) = session.stage.clone() else {
        return reject(session, &ValidationError::UnexpectedInput);
    };

    let (next, effect) = match step(stage, text) {
        Ok(advance) => advance,
        Err(error) => return reject(session, &error),
    };
    session.stage = next;
    smallvec![effect]
}

pub(super) fn on_photo(session: &mut Session, file_id: String) -> Effects {
    match session.stage.clone() {
        Stage::Admin(AdminStage::ProductImage {
            name,
            description,
            price,
        }) => {
            session.stage = Stage::Admin(AdminStage::ProductStock {
                name,
                description,
                price,
                image_url: Some(file_id),
            });
            smallvec![ChatEffect::prompt(prompts::ADMIN_ENTER_STOCK)]
        },
        _ => reject(session, &ValidationError::UnexpectedInput),
    }
}

/// Parses one field, returning the next stage and what to show.
fn step(stage: AdminStage, text: &str) -> Result<(Stage, ChatEffect), ValidationError> {
    let advance = match stage {
        AdminStage::ProductName => {
            let name = validation::parse_required(text)?;
            (
                Stage::Admin(AdminStage::ProductDescription { name }),
                ChatEffect::prompt(prompts::ADMIN_ENTER_DESCRIPTION),
            )
        },
        AdminStage::ProductDescription { name } => {
            let description = validation::parse_required(text)?;
            (
                Stage::Admin(AdminStage::ProductPrice { name, description }),
                ChatEffect::prompt(prompts::ADMIN_ENTER_PRICE),
            )
        },
        AdminStage::ProductPrice { name, description } => {
            let price = validation::parse_price(text)?;
            (
                Stage::Admin(AdminStage::ProductImage {
                    name,
                    description,
                    price,
                }),
                ChatEffect::prompt(prompts::ADMIN_SEND_IMAGE),
            )
        },
        AdminStage::ProductImage {
            name,
            description,
            price,
        } => {
            let reference = validation::parse_required(text)?;
            let image_url = (reference != SKIP_IMAGE).then_some(reference);
            (
                Stage::Admin(AdminStage::ProductStock {
                    name,
                    description,
                    price,
                    image_url,
                }),
                ChatEffect::prompt(prompts::ADMIN_ENTER_STOCK),
            )
        },
        AdminStage::ProductStock {
            name,
            description,
            price,
            image_url,
        } => {
            let stock = validation::parse_stock(text)?;
            (
                Stage::Start,
                ChatEffect::CreateProduct(NewProduct {
                    name,
                    description,
                    price,
                    image_url,
                    stock,
                }),
            )
        },
        AdminStage::UpdatingStock { product_id } => {
            let stock = validation::parse_stock(text)?;
            (Stage::Start, ChatEffect::UpdateStock { product_id, stock })
        },
    };
    Ok(advance)
}
