use crate::data_objects::NewCheckoutSession;

/// Flattens a new session into the bracketed form encoding the gateway expects, e.g.
/// `line_items[0][price_data][unit_amount]=100`.
pub fn session_form_params(session: &NewCheckoutSession) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(4 + session.line_items.len() * 4 + session.metadata.len());
    params.push(("mode".to_string(), "payment".to_string()));
    params.push(("success_url".to_string(), session.success_url.clone()));
    params.push(("cancel_url".to_string(), session.cancel_url.clone()));
    for (i, item) in session.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        params.push((format!("{prefix}[price_data][currency]"), session.currency.clone()));
        params.push((format!("{prefix}[price_data][product_data][name]"), item.name.clone()));
        params.push((format!("{prefix}[price_data][unit_amount]"), item.unit_amount.value().to_string()));
        params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }
    for (key, value) in &session.metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
    }
    params
}
