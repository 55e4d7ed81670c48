//! Upstream trees: how the total result of one flow or impact category is
//! passed along the supply chain, provider by provider.
use crate::index::ProcessProduct;
use crate::matrix::{DenseMatrix, Matrix};
use crate::model::Provider;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamNode {
    pub product: ProcessProduct,
    pub position: usize,
    /// Amount of the product required by the parent node.
    pub amount: f64,
    /// Upstream total of the product for that amount.
    pub result: f64,
    pub children: Vec<UpstreamNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamTree {
    /// Name of the flow or impact category.
    pub name: String,
    pub root: UpstreamNode,
}

/// Inputs of the tree expansion taken from a full result.
pub(crate) struct TreeContext<'a> {
    pub products: &'a [ProcessProduct],
    pub tech_matrix: &'a DenseMatrix,
    /// Row of `B * A^-1` (or `C * B * A^-1`) for the requested flow or category.
    pub intensities: &'a [f64],
    pub loop_factors: &'a [f64],
}

impl TreeContext<'_> {
    /// Expands the tree from the reference product, `max_depth` levels below
    /// the root. Loops in the supply chain repeat until the depth is reached.
    pub(crate) fn expand(&self, name: String, root_amount: f64, max_depth: usize) -> UpstreamTree {
        UpstreamTree { name, root: self.node(0, root_amount, 0, max_depth) }
    }

    fn node(&self, position: usize, amount: f64, depth: usize, max_depth: usize) -> UpstreamNode {
        let result = self.intensities[position] * amount * self.loop_factors[position];
        let mut node = UpstreamNode { product: self.products[position], position, amount, result, children: Vec::new() };
        let output = self.tech_matrix.get(position, position);
        if depth >= max_depth || output == 0.0 {
            return node;
        }
        let scaling = amount / output;
        for row in 0..self.products.len() {
            let value = self.tech_matrix.get(row, position);
            if row == position || value == 0.0 {
                continue;
            }
            node.children.push(self.node(row, -value * scaling, depth + 1, max_depth));
        }
        node.children.sort_by(|a, b| b.result.abs().total_cmp(&a.result.abs()));
        node
    }
}

impl UpstreamTree {
    /// Renders the tree with one line per node. `label` names the products.
    pub fn format(&self, label: &dyn Fn(&ProcessProduct) -> String) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "UPSTREAM TREE for '{}':", self.name);
        let _ = writeln!(out, "--------------------------------------------------");
        write_node(&mut out, &self.root, label, 1, "", "");
        out
    }
}

/// Default product label: provider and flow ids.
pub fn product_label(product: &ProcessProduct) -> String {
    match product.provider {
        Provider::Process(p) => format!("process {} / flow {}", p, product.flow),
        Provider::System(s) => format!("system {} / flow {}", s, product.flow),
    }
}

fn write_node(
    out: &mut String,
    node: &UpstreamNode,
    label: &dyn Fn(&ProcessProduct) -> String,
    level: usize,
    prefix: &str,
    stem: &str,
) {
    let _ = writeln!(out, "{}[L{}] {} = {:.3} (amount {:.3})", prefix, level, label(&node.product), node.result, node.amount);
    for (i, child) in node.children.iter().enumerate() {
        let last = i == node.children.len() - 1;
        let connector = if last { "`--" } else { "|--" };
        let child_stem = if last { format!("{}   ", stem) } else { format!("{}|  ", stem) };
        write_node(out, child, label, level + 1, &format!("{}{}", stem, connector), &child_stem);
    }
}
