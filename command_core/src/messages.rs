use rand::seq::SliceRandom;
use rand::Rng;

use crate::marshal::Personality;
use crate::orders::{MarshalId, Order};
use crate::personality::PersonalityCatalog;
use crate::severity::ObjectionLevel;

/// Fills `{marshal}`, `{order}` and `{alternative}` in a phrase template.
pub fn render(
    template: &str,
    marshal: &MarshalId,
    order: &Order,
    alternative: Option<&Order>,
) -> String {
    let alternative = alternative
        .map(Order::describe)
        .unwrap_or_else(|| "hold for further orders".to_string());
    template
        .replace("{marshal}", marshal.as_str())
        .replace("{order}", &order.describe())
        .replace("{alternative}", &alternative)
}

/// Picks a phrase for `level` from the archetype's pool and renders it.
pub fn compose<R: Rng + ?Sized>(
    catalog: &PersonalityCatalog,
    personality: Personality,
    level: ObjectionLevel,
    marshal: &MarshalId,
    order: &Order,
    alternative: Option<&Order>,
    rng: &mut R,
) -> String {
    let pool = catalog.phrases(personality).map(|phrases| match level {
        ObjectionLevel::Major => phrases.major.as_slice(),
        _ => phrases.mild.as_slice(),
    });
    let template = match pool {
        Some([only]) => Some(only),
        Some(pool) => pool.choose(rng),
        None => None,
    };
    match template {
        Some(template) => render(template, marshal, order, alternative),
        None => fallback(level, marshal, order, alternative),
    }
}

fn fallback(
    level: ObjectionLevel,
    marshal: &MarshalId,
    order: &Order,
    alternative: Option<&Order>,
) -> String {
    match (level, alternative) {
        (ObjectionLevel::Major, Some(alternative)) => format!(
            "{marshal} objects to the order to {} and proposes to {} instead.",
            order.describe(),
            alternative.describe()
        ),
        _ => format!(
            "{marshal} has reservations about the order to {}.",
            order.describe()
        ),
    }
}
