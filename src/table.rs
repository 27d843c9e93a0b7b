//! Recognize row/cell fields and fold them into table descriptors.
//!
//! A field is table-shaped when its selector walks through a `tr` into a
//! `td` and its name mentions both. Such fields are grouped by the part of
//! their name before the row token, each group is located in the tree,
//! and the header row found below the owning `table` names the columns.

use log::{debug, warn};

use crate::dedup::Field;
use crate::path;
use crate::selector::{Anchor, Filter, Selector, SelectorStep};
use crate::tree::Tree;

const ROW: &str = "tr";
const CELL: &str = "td";
const HEADER_CELL: &str = "th";
const TABLE: &str = "table";

/// One named column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Column {
    pub name: String,
    /// Cell selector relative to a row, e.g. `./td[2]`.
    pub pattern: Selector,
}

/// A reconstructed table: which rows to visit and what to read from each.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableDescriptor {
    /// Matches every row of the table.
    pub rows: Selector,
    /// In header order.
    pub columns: Vec<Column>,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&Selector> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.pattern)
    }
}

/// Where a selector crosses from row to cell.
struct RowSplit {
    row: usize,
    cell: usize,
}

fn row_split(selector: &Selector) -> Option<RowSplit> {
    let steps = selector.steps();
    let cell = steps.iter().rposition(|s| s.tag == CELL)?;
    let row = steps[..cell].iter().rposition(|s| s.tag == ROW)?;
    Some(RowSplit { row, cell })
}

/// `tr`, `tr[3]` and the like, as `_`-separated name tokens.
fn is_token(token: &str, marker: &str) -> bool {
    token
        .strip_prefix(marker)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('['))
}

fn has_token(name: &str, marker: &str) -> bool {
    name.split('_').any(|t| is_token(t, marker))
}

fn is_table_shaped(field: &Field) -> bool {
    row_split(&field.selector).is_some()
        && has_token(&field.name, ROW)
        && has_token(&field.name, CELL)
}

/// Name tokens before the first row token.
fn group_prefix(name: &str) -> String {
    name.split('_')
        .take_while(|t| !is_token(t, ROW))
        .collect::<Vec<_>>()
        .join("_")
}

/// A table-shaped field pinned down in the tree.
struct Located<N> {
    order: usize,
    field: Field,
    /// Matches the rows of `table` and no others.
    rows: Selector,
    cell: Selector,
    column: usize,
    table: N,
}

/// Split `fields` into plain fields and reconstructed tables.
///
/// Each field is located through its raw path, so fields of one group that
/// sit in different tables give one descriptor per table. Fields whose table
/// cannot be found in `tree` stay plain fields. Plain fields keep their
/// input order.
pub fn reconstruct<T: Tree>(tree: &T, fields: Vec<Field>) -> (Vec<Field>, Vec<TableDescriptor>) {
    let (mut remaining, mut flat): (Vec<_>, Vec<_>) = fields
        .into_iter()
        .enumerate()
        .partition(|(_, f)| is_table_shaped(f));

    if remaining.is_empty() {
        return (flat.into_iter().map(|(_, f)| f).collect(), Vec::new());
    }

    let mut prefixes: Vec<String> = Vec::new();
    for (_, f) in &remaining {
        let prefix = group_prefix(&f.name);
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }
    // Longest first, so a specific table claims its fields before a shorter prefix can
    prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));

    let mut tables = Vec::new();
    for prefix in &prefixes {
        let (group, rest): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|(_, f)| f.name.starts_with(prefix.as_str()));
        remaining = rest;

        let mut by_table: Vec<Vec<Located<T::Node>>> = Vec::new();
        for (order, field) in group {
            let located = match locate(tree, order, field) {
                Ok(l) => l,
                Err((order, field)) => {
                    flat.push((order, field));
                    continue;
                }
            };
            match by_table.iter().position(|m| m[0].table == located.table) {
                Some(i) => by_table[i].push(located),
                None => by_table.push(vec![located]),
            }
        }
        tables.extend(by_table.iter().filter_map(|m| build_descriptor(tree, m)));
    }

    flat.sort_by_key(|(order, _)| *order);
    (flat.into_iter().map(|(_, f)| f).collect(), tables)
}

fn locate<T: Tree>(
    tree: &T,
    order: usize,
    field: Field,
) -> Result<Located<T::Node>, (usize, Field)> {
    let Some(split) = row_split(&field.selector) else {
        return Err((order, field));
    };
    let Some(target) = path::resolve(tree, &field.raw_path) else {
        warn!("{}: {} not found, keeping as a plain field", field.name, field.raw_path);
        return Err((order, field));
    };

    // The selector's trailing steps mirror the raw path, so the row sits
    // as many levels above the target as the selector puts after the row step
    let depth = field.selector.steps().len() - 1 - split.row;
    let Some(row) = nth_ancestor(tree, target, depth).filter(|&r| tree.tag(r) == ROW) else {
        warn!("{}: no row above {}, keeping as a plain field", field.name, field.raw_path);
        return Err((order, field));
    };

    // Ancestor tags from the row's parent up to the owning table
    let mut chain: Vec<String> = Vec::new();
    let mut current = row;
    let table = loop {
        let Some(parent) = tree.parent(current) else {
            warn!("{}: no table above {}, keeping as a plain field", field.name, field.raw_path);
            return Err((order, field));
        };
        chain.push(tree.tag(parent).to_string());
        if tree.tag(parent) == TABLE {
            break parent;
        }
        current = parent;
    };

    let row_part = field.selector.truncate(split.row + 1);
    let above_row = &row_part.steps()[..split.row];
    let template = if above_row.iter().any(|s| s.tag == TABLE) {
        row_part
    } else {
        // Selector steps above the row cover the nearest ancestors; prepend the rest
        let mut steps: Vec<SelectorStep> = chain
            .get(above_row.len()..)
            .unwrap_or_default()
            .iter()
            .rev()
            .map(|tag| SelectorStep::new(tag.clone(), Filter::Any))
            .collect();
        steps.extend(row_part.steps().iter().cloned());
        Selector::new(Anchor::Descendant, steps)
    };

    let mut rows = all_rows(&template);
    if !confined_to(tree, &rows, table) {
        debug!("{}: {} reaches other tables, using the absolute row path", field.name, rows);
        rows = all_rows(&Selector::absolute(&path::address_of(tree, row)));
    }

    let cell = field.selector.tail(split.row + 1);
    let column = field.selector.steps()[split.cell].index();

    Ok(Located {
        order,
        field,
        rows,
        cell,
        column,
        table,
    })
}

fn nth_ancestor<T: Tree>(tree: &T, node: T::Node, n: usize) -> Option<T::Node> {
    (0..n).try_fold(node, |current, _| tree.parent(current))
}

fn owning_table<T: Tree>(tree: &T, node: T::Node) -> Option<T::Node> {
    let mut current = node;
    loop {
        let parent = tree.parent(current)?;
        if tree.tag(parent) == TABLE {
            return Some(parent);
        }
        current = parent;
    }
}

/// `row` with its last step's position dropped.
fn all_rows(row: &Selector) -> Selector {
    let mut steps = row.steps().to_vec();
    if let Some(last) = steps.last_mut() {
        *last = last.generalized();
    }
    Selector::new(row.anchor(), steps)
}

/// Whether every node `rows` selects belongs directly to `table`.
fn confined_to<T: Tree>(tree: &T, rows: &Selector, table: T::Node) -> bool {
    rows.select(tree)
        .into_iter()
        .all(|r| owning_table(tree, r) == Some(table))
}

/// Labels of the first header row below `table`, following first children.
fn recover_header<T: Tree>(tree: &T, table: T::Node) -> Option<Vec<String>> {
    let mut current = table;
    loop {
        let children = tree.children(current);
        let &first = children.first()?;
        if tree.tag(first) == HEADER_CELL {
            return Some(
                children
                    .iter()
                    .map(|&c| tree.string_value(c).trim().to_string())
                    .collect(),
            );
        }
        current = first;
    }
}

/// One descriptor for fields that all live in the same table.
fn build_descriptor<T: Tree>(tree: &T, members: &[Located<T::Node>]) -> Option<TableDescriptor> {
    let first = members.first()?;

    // One column per distinct cell pattern, in header order
    let mut cells: Vec<&Located<T::Node>> = Vec::new();
    for member in members {
        if !cells.iter().any(|c| c.cell == member.cell) {
            cells.push(member);
        }
    }
    cells.sort_by_key(|c| c.column);

    let header = recover_header(tree, first.table);
    if header.is_none() {
        debug!("{}: no header row, naming columns by cell pattern", first.rows);
    }

    let mut columns: Vec<Column> = Vec::with_capacity(cells.len());
    for cell in cells {
        let label = header
            .as_ref()
            .and_then(|h| h.get(cell.column - 1))
            .filter(|l| !l.is_empty() && !columns.iter().any(|c| &c.name == *l));
        let name = match label {
            Some(l) => l.clone(),
            None => cell.cell.to_string(),
        };
        debug!("{} -> column {name:?} (order {})", cell.field.name, cell.order);
        columns.push(Column {
            name,
            pattern: cell.cell.clone(),
        });
    }

    Some(TableDescriptor {
        rows: first.rows.clone(),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fake::{El, FakeTree, el};

    fn field(name: &str, selector: &str, raw_path: &str) -> Field {
        Field {
            name: name.to_string(),
            selector: selector.parse().unwrap(),
            raw_path: raw_path.parse().unwrap(),
        }
    }

    /// A unique-suffix cell field inside the only table of `priced_table`.
    fn cell_field(row: usize, column: usize) -> Field {
        field(
            &format!("tr[{row}]_td[{column}]"),
            &format!("//tr[{row}]/td[{column}]"),
            &format!("/html/body/table/tbody/tr[{row}]/td[{column}]"),
        )
    }

    fn row(cells: &[&str], tag: &str) -> El {
        cells
            .iter()
            .fold(el("tr"), |tr, text| tr.child(el(tag).text(text)))
    }

    fn priced_table() -> FakeTree {
        FakeTree::new(
            el("html").child(
                el("body").child(el("h1").text("Catalog")).child(
                    el("table").child(
                        el("tbody")
                            .child(row(&["Name", "Price"], "th"))
                            .child(row(&["Apple", "1"], "td"))
                            .child(row(&["Pear", "2"], "td")),
                    ),
                ),
            ),
        )
    }

    fn column_names(table: &TableDescriptor) -> Vec<&str> {
        table.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_tokens() {
        assert!(has_token("tr[2]_td[1]", ROW));
        assert!(has_token("main_table_tbody_tr_td[3]", CELL));
        assert!(!has_token("strong_tdx", CELL));
        assert_eq!(group_prefix("tr[2]_td[1]"), "");
        assert_eq!(group_prefix("table[2]_tbody_tr[3]_td"), "table[2]_tbody");
    }

    #[test]
    fn test_no_table_fields_pass_through() {
        let fields = vec![
            field("h1", "//h1", "/html/body/h1"),
            field("price", "//span[@class=\"price\"]", "/html/body/span"),
        ];
        let (flat, tables) = reconstruct(&priced_table(), fields.clone());
        assert_eq!(flat, fields);
        assert!(tables.is_empty());
    }

    #[test]
    fn test_header_names_columns_in_order() {
        let fields = vec![
            field("h1", "//h1", "/html/body/h1"),
            cell_field(2, 1),
            cell_field(2, 2),
            cell_field(3, 1),
            cell_field(3, 2),
        ];
        let (flat, tables) = reconstruct(&priced_table(), fields);

        assert_eq!(flat, vec![field("h1", "//h1", "/html/body/h1")]);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.rows.to_string(), "//table/tbody/tr");
        assert_eq!(column_names(table), vec!["Name", "Price"]);
        assert_eq!(table.column("Name").unwrap().to_string(), "./td[1]");
        assert_eq!(table.column("Price").unwrap().to_string(), "./td[2]");
    }

    #[test]
    fn test_rows_pattern_selects_every_row() {
        let tree = priced_table();
        let fields = vec![
            cell_field(2, 2),
            cell_field(2, 1),
        ];
        let (_, tables) = reconstruct(&tree, fields);
        let table = &tables[0];

        // Sorted back into header order
        assert_eq!(column_names(table), vec!["Name", "Price"]);

        let prices: Vec<String> = table
            .rows
            .select(&tree)
            .into_iter()
            .flat_map(|r| table.column("Price").unwrap().select_from(&tree, r))
            .map(|c| tree.own_text(c))
            .collect();
        assert_eq!(prices, vec!["1", "2"]);
    }

    #[test]
    fn test_anchor_outside_table_keeps_selector_prefix() {
        let tree = FakeTree::new(
            el("html").child(
                el("body").child(
                    el("div").attr("id", "list").child(
                        el("table").child(
                            el("tbody")
                                .child(row(&["A", "B"], "th"))
                                .child(row(&["1", "2"], "td")),
                        ),
                    ),
                ),
            ),
        );
        let fields = vec![field(
            "list_table_tbody_tr[2]_td[2]",
            "//div[@id=\"list\"]/table/tbody/tr[2]/td[2]",
            "/html/body/div/table/tbody/tr[2]/td[2]",
        )];
        let (flat, tables) = reconstruct(&tree, fields);
        assert!(flat.is_empty());
        assert_eq!(tables[0].rows.to_string(), "//div[@id=\"list\"]/table/tbody/tr");
        assert_eq!(column_names(&tables[0]), vec!["B"]);
    }

    #[test]
    fn test_class_anchored_row() {
        let tree = FakeTree::new(
            el("html").child(
                el("body").child(
                    el("table").child(
                        el("tbody").child(
                            el("tr")
                                .attr("class", "odd")
                                .child(el("td").text("x"))
                                .child(el("td").text("y")),
                        ),
                    ),
                ),
            ),
        );
        let fields = vec![field(
            "odd_tr_td[2]",
            "//tr[@class=\"odd\"]/td[2]",
            "/html/body/table/tbody/tr/td[2]",
        )];
        let (_, tables) = reconstruct(&tree, fields);
        assert_eq!(tables[0].rows.to_string(), "//table/tbody/tr[@class=\"odd\"]");
        // No header row: named by cell pattern
        assert_eq!(column_names(&tables[0]), vec!["./td[2]"]);
    }

    #[test]
    fn test_missing_table_falls_back_to_plain_fields() {
        // html5ever would never produce this, but other trees can
        let tree = FakeTree::new(
            el("html").child(el("body").child(el("tr").child(el("td").text("loose")))),
        );
        let fields = vec![
            field("h1", "//h1", "/html/body/h1"),
            field("tr_td", "//body/tr/td", "/html/body/tr/td"),
        ];
        let (flat, tables) = reconstruct(&tree, fields.clone());
        assert!(tables.is_empty());
        assert_eq!(flat, fields);
    }

    #[test]
    fn test_longest_prefix_claims_its_table_first() {
        let table = |first: &str| {
            el("table").child(
                el("tbody")
                    .child(row(&[first, "Qty"], "th"))
                    .child(row(&["a", "1"], "td")),
            )
        };
        let tree = FakeTree::new(
            el("html").child(
                el("body")
                    .child(el("div").attr("id", "left").child(table("Fruit")))
                    .child(el("div").attr("id", "right").child(table("Veg"))),
            ),
        );
        let fields = vec![
            field(
                "left_table_tbody_tr[2]_td[1]",
                "//div[@id=\"left\"]/table/tbody/tr[2]/td[1]",
                "/html/body/div[1]/table/tbody/tr[2]/td[1]",
            ),
            field(
                "right_table_tbody_tr[2]_td[1]",
                "//div[@id=\"right\"]/table/tbody/tr[2]/td[1]",
                "/html/body/div[2]/table/tbody/tr[2]/td[1]",
            ),
        ];
        let (flat, tables) = reconstruct(&tree, fields);
        assert!(flat.is_empty());
        assert_eq!(tables.len(), 2);
        let names: Vec<Vec<&str>> = tables.iter().map(column_names).collect();
        assert!(names.contains(&vec!["Fruit"]));
        assert!(names.contains(&vec!["Veg"]));
    }

    #[test]
    fn test_row_selector_matching_an_earlier_table() {
        let tree = FakeTree::new(
            el("html").child(
                el("body")
                    .child(
                        el("table").child(
                            el("tbody")
                                .child(row(&["Wrong"], "th"))
                                .child(row(&["layout"], "td")),
                        ),
                    )
                    .child(
                        el("table").child(
                            el("tbody")
                                .child(row(&["Name", "Price"], "th"))
                                .child(row(&["Apple", "1"], "td"))
                                .child(row(&["Pear", "2"], "td")),
                        ),
                    ),
            ),
        );
        let fields: Vec<Field> = [(2, 1), (2, 2), (3, 1), (3, 2)]
            .into_iter()
            .map(|(r, c)| {
                field(
                    &format!("tr[{r}]_td[{c}]"),
                    &format!("//tr[{r}]/td[{c}]"),
                    &format!("/html/body/table[2]/tbody/tr[{r}]/td[{c}]"),
                )
            })
            .collect();
        let (flat, tables) = reconstruct(&tree, fields);

        assert!(flat.is_empty());
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(column_names(table), vec!["Name", "Price"]);
        // `//table/tbody/tr` would also match the first table
        assert_eq!(table.rows.to_string(), "/html/body/table[2]/tbody/tr");
        assert_eq!(table.rows.select(&tree).len(), 3);
    }

    #[test]
    fn test_duplicate_header_label_keeps_both_columns() {
        let tree = FakeTree::new(
            el("html").child(
                el("body").child(
                    el("table").child(
                        el("tbody")
                            .child(row(&["Price", "Price"], "th"))
                            .child(row(&["1", "2"], "td")),
                    ),
                ),
            ),
        );
        let fields = vec![cell_field(2, 2), cell_field(2, 1)];
        let (flat, tables) = reconstruct(&tree, fields);

        assert!(flat.is_empty());
        assert_eq!(column_names(&tables[0]), vec!["Price", "./td[2]"]);
        assert_eq!(tables[0].column("./td[2]").unwrap().to_string(), "./td[2]");
    }

    #[test]
    fn test_unresolvable_raw_path_stays_plain() {
        let fields = vec![field(
            "tr[9]_td[1]",
            "//tr[9]/td[1]",
            "/html/body/table/tbody/tr[9]/td[1]",
        )];
        let (flat, tables) = reconstruct(&priced_table(), fields.clone());
        assert!(tables.is_empty());
        assert_eq!(flat, fields);
    }
}
