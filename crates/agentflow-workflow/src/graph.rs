use std::collections::HashSet;

use crate::path::ValuePath;
use crate::step::Step;

/// Data dependencies between steps, for traversal and analysis.
///
/// Step `b` depends on an earlier step `a` when they touch the same state key:
/// `b` reads `a`'s output key, both write the same output key, or `a` reads
/// the key `b` writes. Keeping those pairs in separate layers means running
/// layer by layer leaves the state as declaration order would.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: step index -> downstream step indices.
  adjacency: Vec<Vec<usize>>,
  /// Reverse adjacency: step index -> upstream step indices.
  reverse_adjacency: Vec<Vec<usize>>,
  /// Steps with no upstream dependency.
  entry_points: Vec<usize>,
  /// Steps waiting on more than one upstream step.
  join_points: HashSet<usize>,
}

impl Graph {
  /// Build the dependency graph for a list of steps.
  pub fn new(steps: &[Step]) -> Self {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];
    let mut reverse_adjacency: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];

    for (to, step) in steps.iter().enumerate() {
      let roots: HashSet<&str> = step
        .input
        .references()
        .into_iter()
        .map(ValuePath::root)
        .collect();

      let writes = step.output_key.as_deref();

      for (from, upstream) in steps[..to].iter().enumerate() {
        let upstream_writes = upstream.output_key.as_deref();
        let produces = upstream_writes.is_some_and(|key| roots.contains(key));
        let overwrites = upstream_writes.is_some() && upstream_writes == writes;
        let read_before_write = writes.is_some_and(|key| {
          upstream
            .input
            .references()
            .into_iter()
            .any(|r| r.root() == key)
        });
        if produces || overwrites || read_before_write {
          adjacency[from].push(to);
          reverse_adjacency[to].push(from);
        }
      }
    }

    let entry_points: Vec<usize> = reverse_adjacency
      .iter()
      .enumerate()
      .filter(|(_, incoming)| incoming.is_empty())
      .map(|(idx, _)| idx)
      .collect();

    let join_points: HashSet<usize> = reverse_adjacency
      .iter()
      .enumerate()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(idx, _)| idx)
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
    }
  }

  /// Get entry points (steps with no earlier step to wait for).
  pub fn entry_points(&self) -> &[usize] {
    &self.entry_points
  }

  /// Get later steps that must run after the given step.
  pub fn downstream(&self, index: usize) -> &[usize] {
    self
      .adjacency
      .get(index)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get earlier steps the given step must run after.
  pub fn upstream(&self, index: usize) -> &[usize] {
    self
      .reverse_adjacency
      .get(index)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check if a step waits on more than one upstream step.
  pub fn is_join_point(&self, index: usize) -> bool {
    self.join_points.contains(&index)
  }

  /// Split the steps into layers that can run concurrently.
  ///
  /// A step's layer is one past the deepest layer among its upstream steps, so
  /// no step shares a layer with a step it depends on. Within a layer, steps
  /// keep declaration order.
  pub fn layers(&self) -> Vec<Vec<usize>> {
    let mut depth = vec![0usize; self.reverse_adjacency.len()];
    // Edges only point forward, so one pass in declaration order suffices.
    for (idx, upstream) in self.reverse_adjacency.iter().enumerate() {
      let d = upstream.iter().map(|up| depth[*up] + 1).max().unwrap_or(0);
      depth[idx] = d;
    }

    let count = depth.iter().max().map_or(0, |d| d + 1);
    let mut layers = vec![Vec::new(); count];
    for (idx, d) in depth.iter().enumerate() {
      layers[*d].push(idx);
    }
    layers
  }
}
