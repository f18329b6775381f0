use std::collections::HashSet;

use super::{ConnectionsCollection, ConnectionsCollectionMap};

/// Every way of picking one collection per category.
///
/// Categories are visited in key order, the last category varies fastest.
/// Empty categories take no part.
pub fn get_all_combinations(connections: &ConnectionsCollectionMap) -> Vec<Vec<&ConnectionsCollection>> {
	let categories: Vec<&Vec<ConnectionsCollection>> = connections.values().filter(|c| !c.is_empty()).collect();
	if categories.is_empty() {
		return vec![]
	}

	let mut combinations = vec![];
	let mut indices = vec![0usize; categories.len()];
	loop {
		combinations.push(categories.iter().zip(&indices).map(|(c, i)| &c[*i]).collect());

		/* odometer step */
		let mut position = categories.len();
		loop {
			if position == 0 {
				return combinations
			}
			position -= 1;
			indices[position] += 1;
			if indices[position] < categories[position].len() {
				break;
			}
			indices[position] = 0;
		}
	}
}

/// Every non-empty subset of `items`.
///
/// Each element first extends every subset produced so far, in order, then appears alone:
/// `{A}, {A,B}, {B}, {A,C}, {A,B,C}, {B,C}, {C}, ...`
pub fn get_all_select_combinations<T>(items: &[T]) -> Vec<Vec<&T>> {
	let mut combinations: Vec<Vec<&T>> = vec![];
	for item in items {
		let produced = combinations.len();
		for i in 0..produced {
			let mut extended = combinations[i].clone();
			extended.push(item);
			combinations.push(extended);
		}
		combinations.push(vec![item]);
	}
	combinations
}

/// Drops every combination whose members are all contained in another combination.
///
/// Membership is compared by filename regardless of order, among equal combinations the first is kept.
pub fn remove_redundant_subsets<'a>(combinations: Vec<Vec<&'a ConnectionsCollection>>) -> Vec<Vec<&'a ConnectionsCollection>> {
	let sets: Vec<HashSet<&str>> = combinations.iter()
		.map(|c| c.iter().map(|m| m.filename.as_str()).collect())
		.collect();

	combinations.into_iter()
		.enumerate()
		.filter(|(i, _)| {
			!sets.iter().enumerate().any(|(j, other)| {
				j != *i && sets[*i].is_subset(other) && (sets[*i].len() < other.len() || j < *i)
			})
		})
		.map(|(_, c)| c)
		.collect()
}
