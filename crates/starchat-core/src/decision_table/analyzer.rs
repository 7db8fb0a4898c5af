//! Textual rewrite of analyzer expressions
//!
//! This is not an expression parser. It only handles analyzers shaped like
//! `reinforcementConjunction(search("<state>"), <rest>)`: the search clause is
//! removed by exact text match and then one layer of outer call is peeled off.
//! Other shapes still produce a deterministic slice of the input.

/// Remove the `search("<state_name>"), ` clause and unwrap the outer call
pub fn strip_search_clause(analyzer: &str, state_name: &str) -> String {
    let clause = format!("search(\"{state_name}\"), ");
    let stripped = analyzer.replace(&clause, "");
    unwrap_outer_call(&stripped).to_string()
}

/// Text strictly between the first `(` and the final character
///
/// Without any `(` the slice starts at the beginning of the string. An empty
/// or inverted range yields `""`.
pub fn unwrap_outer_call(expression: &str) -> &str {
    let start = expression.find('(').map_or(0, |open| open + 1);
    let end = expression
        .char_indices()
        .last()
        .map_or(0, |(index, _)| index);
    if start >= end {
        ""
    } else {
        &expression[start..end]
    }
}
