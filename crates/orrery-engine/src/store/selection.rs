use serde::Deserialize;

use crate::bodies::Body;

/// A request to change the selected body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Body(Body),
    /// Display name, case-insensitive. Unknown names are ignored.
    Name(String),
    None,
    Next,
    Previous,
    First,
    Last,
}

/// Work out the new selection. `None` means the request is a no-op.
///
/// Next/Previous walk `order` and stop at the ends. From an empty selection,
/// or one outside `order` (the Moon), Next lands on the first body and
/// Previous on the last.
pub(crate) fn resolve_selection(
    request: &Selection,
    current: Option<Body>,
    order: &[Body],
    visible: &[Body],
) -> Option<Option<Body>> {
    let position = current.and_then(|c| order.iter().position(|&b| b == c));
    match request {
        Selection::Body(body) => visible.contains(body).then_some(Some(*body)),
        Selection::Name(name) => {
            let body = Body::from_name(name)?;
            visible.contains(&body).then_some(Some(body))
        }
        Selection::None => Some(None),
        Selection::First => order.first().map(|&b| Some(b)),
        Selection::Last => order.last().map(|&b| Some(b)),
        Selection::Next => match position {
            Some(i) => order.get(i + 1).map(|&b| Some(b)),
            None => order.first().map(|&b| Some(b)),
        },
        Selection::Previous => match position {
            Some(0) => None,
            Some(i) => Some(Some(order[i - 1])),
            None => order.last().map(|&b| Some(b)),
        },
    }
}
