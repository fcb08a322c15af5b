//! Bordered table detection from ruling lines.
//!
//! Edges are snapped and joined, crossings between horizontal and vertical
//! edges become grid points, and every grid rectangle whose four corners exist
//! becomes a cell. Cells that share a border are grouped into one table.

use std::collections::HashMap;

use crate::options::GeometrySettings;
use crate::page_objects::{
    BBox, Edge, GridTable, Orientation, PageObjects, TextFragment, sort_tables,
};

const EPS: f64 = 1e-6;

fn float_key(value: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let key = (value * 1000.0).round() as i64;
    key
}

fn position(edge: &Edge) -> f64 {
    match edge.orientation {
        Orientation::Horizontal => edge.y0,
        Orientation::Vertical => edge.x0,
    }
}

fn set_position(edge: &mut Edge, value: f64) {
    match edge.orientation {
        Orientation::Horizontal => {
            edge.y0 = value;
            edge.y1 = value;
        }
        Orientation::Vertical => {
            edge.x0 = value;
            edge.x1 = value;
        }
    }
}

fn span(edge: &Edge) -> (f64, f64) {
    match edge.orientation {
        Orientation::Horizontal => (edge.x0, edge.x1),
        Orientation::Vertical => (edge.y0, edge.y1),
    }
}

fn set_span(edge: &mut Edge, start: f64, end: f64) {
    match edge.orientation {
        Orientation::Horizontal => {
            edge.x0 = start;
            edge.x1 = end;
        }
        Orientation::Vertical => {
            edge.y0 = start;
            edge.y1 = end;
        }
    }
}

/// Aligns parallel edges whose positions lie within `tolerance` of each
/// other to the cluster mean.
fn snap(mut edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    edges.sort_by(|a, b| position(a).total_cmp(&position(b)));

    let mut snapped = Vec::with_capacity(edges.len());
    let mut cluster: Vec<Edge> = Vec::new();
    let flush = |cluster: &mut Vec<Edge>, snapped: &mut Vec<Edge>| {
        if cluster.is_empty() {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = cluster.iter().map(position).sum::<f64>() / cluster.len() as f64;
        for mut edge in cluster.drain(..) {
            set_position(&mut edge, mean);
            snapped.push(edge);
        }
    };

    for edge in edges {
        let joins_cluster = cluster
            .last()
            .is_some_and(|last| position(&edge) - position(last) <= tolerance);
        if !joins_cluster {
            flush(&mut cluster, &mut snapped);
        }
        cluster.push(edge);
    }
    flush(&mut cluster, &mut snapped);
    snapped
}

/// Merges collinear edges that overlap or are separated by at most
/// `tolerance`.
fn join(edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    let mut by_position: HashMap<i64, Vec<Edge>> = HashMap::new();
    for edge in edges {
        by_position.entry(float_key(position(&edge))).or_default().push(edge);
    }

    let mut joined = Vec::new();
    for (_, mut group) in by_position {
        group.sort_by(|a, b| span(a).0.total_cmp(&span(b).0));
        let mut current: Option<Edge> = None;
        for edge in group {
            current = match current {
                Some(mut merged) if span(&edge).0 <= span(&merged).1 + tolerance => {
                    let end = span(&merged).1.max(span(&edge).1);
                    let start = span(&merged).0;
                    set_span(&mut merged, start, end);
                    Some(merged)
                }
                Some(finished) => {
                    joined.push(finished);
                    Some(edge)
                }
                None => Some(edge),
            };
        }
        joined.extend(current);
    }
    joined
}

fn normalize_edges(edges: &[Edge], settings: &GeometrySettings) -> Vec<Edge> {
    let (horizontal, vertical): (Vec<Edge>, Vec<Edge>) = edges
        .iter()
        .copied()
        .partition(|edge| edge.orientation == Orientation::Horizontal);

    let mut normalized = join(snap(horizontal, settings.snap_tolerance), settings.join_tolerance);
    normalized.extend(join(
        snap(vertical, settings.snap_tolerance),
        settings.join_tolerance,
    ));
    normalized.retain(|edge| edge.length() >= settings.edge_min_length);
    normalized
}

fn intersections(edges: &[Edge], tolerance: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for h in edges
        .iter()
        .filter(|edge| edge.orientation == Orientation::Horizontal)
    {
        for v in edges
            .iter()
            .filter(|edge| edge.orientation == Orientation::Vertical)
        {
            if v.x0 >= h.x0 - tolerance
                && v.x0 <= h.x1 + tolerance
                && h.y0 >= v.y0 - tolerance
                && h.y0 <= v.y1 + tolerance
            {
                points.push((v.x0, h.y0));
            }
        }
    }

    points.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));
    points.dedup_by(|a, b| (a.0 - b.0).abs() < EPS && (a.1 - b.1).abs() < EPS);
    points
}

fn unique_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut values = values.collect::<Vec<_>>();
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() < EPS);
    values
}

/// Builds cells from grid points. A cell whose right-hand corners are
/// missing extends to the next column boundary that has both, which
/// recovers horizontally merged cells.
fn cells_from_points(points: &[(f64, f64)]) -> Vec<BBox> {
    let xs = unique_sorted(points.iter().map(|point| point.0));
    let ys = unique_sorted(points.iter().map(|point| point.1));
    let has_point = |x: f64, y: f64| {
        points
            .iter()
            .any(|point| (point.0 - x).abs() < EPS && (point.1 - y).abs() < EPS)
    };

    let mut cells = Vec::new();
    for yi in 0..ys.len().saturating_sub(1) {
        let (bottom, top) = (ys[yi], ys[yi + 1]);
        let mut xi = 0;
        while xi + 1 < xs.len() {
            let x0 = xs[xi];
            if !(has_point(x0, bottom) && has_point(x0, top)) {
                xi += 1;
                continue;
            }
            let right = ((xi + 1)..xs.len())
                .find(|&k| has_point(xs[k], bottom) && has_point(xs[k], top));
            match right {
                Some(k) => {
                    cells.push(BBox {
                        x0,
                        y0: bottom,
                        x1: xs[k],
                        y1: top,
                    });
                    xi = k;
                }
                None => break,
            }
        }
    }
    cells
}

fn cells_share_edge(a: &BBox, b: &BBox) -> bool {
    let shared_vertical = ((a.x1 - b.x0).abs() < EPS || (a.x0 - b.x1).abs() < EPS)
        && a.y0 < b.y1 + EPS
        && b.y0 < a.y1 + EPS;
    let shared_horizontal = ((a.y1 - b.y0).abs() < EPS || (a.y0 - b.y1).abs() < EPS)
        && a.x0 < b.x1 + EPS
        && b.x0 < a.x1 + EPS;
    shared_vertical || shared_horizontal
}

fn group_cells(cells: &[BBox]) -> Vec<Vec<BBox>> {
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut parent = (0..cells.len()).collect::<Vec<_>>();
    for i in 0..cells.len() {
        for j in (i + 1)..cells.len() {
            if cells_share_edge(&cells[i], &cells[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut groups: HashMap<usize, Vec<BBox>> = HashMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(*cell);
    }
    groups.into_values().collect()
}

fn cell_text(cell: &BBox, fragments: &[TextFragment]) -> String {
    let mut inside = fragments
        .iter()
        .filter(|fragment| cell.contains(fragment.x + 0.5, fragment.y + 0.5))
        .collect::<Vec<_>>();
    inside.sort_by(|a, b| b.y.total_cmp(&a.y).then_with(|| a.x.total_cmp(&b.x)));
    inside
        .iter()
        .map(|fragment| fragment.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn layout_table(cells: &[BBox], fragments: &[TextFragment]) -> Option<GridTable> {
    let first = cells.first()?;
    let bbox = cells.iter().fold(*first, |acc, cell| acc.union(cell));
    let xs = unique_sorted(cells.iter().flat_map(|cell| [cell.x0, cell.x1]));
    let mut ys = unique_sorted(cells.iter().flat_map(|cell| [cell.y0, cell.y1]));
    ys.reverse();

    let width = xs.len().saturating_sub(1);
    let height = ys.len().saturating_sub(1);
    let mut rows = vec![vec![None; width]; height];
    for cell in cells {
        let row = ys.iter().position(|y| (y - cell.y1).abs() < EPS);
        let column = xs.iter().position(|x| (x - cell.x0).abs() < EPS);
        if let (Some(row), Some(column)) = (row, column) {
            if row < height && column < width {
                rows[row][column] = Some(cell_text(cell, fragments));
            }
        }
    }

    Some(GridTable { bbox, width, rows })
}

/// Finds bordered tables on one page.
pub(crate) fn find_tables(objects: &PageObjects, settings: &GeometrySettings) -> Vec<GridTable> {
    let edges = normalize_edges(&objects.edges, settings);
    let points = intersections(&edges, settings.snap_tolerance);
    let cells = cells_from_points(&points);

    let mut tables = group_cells(&cells)
        .into_iter()
        .filter(|group| group.len() >= 2)
        .filter_map(|group| layout_table(&group, &objects.fragments))
        .collect::<Vec<_>>();
    sort_tables(&mut tables);
    tables
}
