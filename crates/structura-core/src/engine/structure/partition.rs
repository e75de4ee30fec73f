use super::element::ElementSet;
use super::structure::StructureBuilder;
use super::unit::UnitKind;
use crate::core::models::entity::EntityType;
use crate::core::models::hierarchy::CoarseElements;
use crate::core::models::model::Model;
use crate::core::models::operator::SymmetryOperator;
use crate::core::spatial::grid::{GridLookup3D, PositionData};
use crate::engine::error::EngineError;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Splits a model into units: one per chain, with runs of single-atom chains merged,
/// water spans bucketed by the grid, and one unit per coarse chain segment.
#[instrument(skip_all, name = "partition_model", fields(model = %model.label))]
pub(crate) fn partition_model(
    builder: &mut StructureBuilder,
    model: &Arc<Model>,
) -> Result<(), EngineError> {
    let hierarchy = &model.atomic_hierarchy;
    let offsets = hierarchy.chain_atom_segments.offsets();
    let count = hierarchy.chain_atom_segments.count();

    let mut c = 0;
    while c < count {
        let start = offsets[c];
        while c + 1 < count && offsets[c + 1] - offsets[c] == 1 && offsets[c + 2] - offsets[c + 1] == 1 {
            c += 1;
        }
        let elements = ElementSet::of_bounds(start..offsets[c + 1]);

        let entity = hierarchy
            .entity_of_chain(c)
            .ok_or(EngineError::MissingEntity { chain_index: c })?;
        if model.entities.type_of(entity) == EntityType::Water {
            partition_water(builder, model, &elements)?;
        } else {
            builder.add_unit(UnitKind::Atomic, model, SymmetryOperator::default(), elements)?;
        }
        c += 1;
    }

    let coarse = &model.coarse_hierarchy;
    if coarse.is_defined() {
        add_coarse_units(builder, model, &coarse.spheres, UnitKind::Spheres)?;
        add_coarse_units(builder, model, &coarse.gaussians, UnitKind::Gaussians)?;
    }

    debug!(units = builder.len(), "Model partitioned.");
    Ok(())
}

/// One unit per non-empty grid cell over the water atoms.
fn partition_water(
    builder: &mut StructureBuilder,
    model: &Arc<Model>,
    elements: &ElementSet,
) -> Result<(), EngineError> {
    let conformation = &model.atomic_conformation;
    let lookup = GridLookup3D::new(
        PositionData {
            x: conformation.x(),
            y: conformation.y(),
            z: conformation.z(),
            indices: elements.as_slice(),
            radius: None,
        },
        builder.config().grid_cell_size,
    );
    let buckets = lookup.buckets();
    for i in 0..buckets.len() {
        let set: Vec<usize> = buckets
            .bucket(i)
            .iter()
            .map(|&k| lookup.indices()[k])
            .collect();
        builder.add_unit(
            UnitKind::Atomic,
            model,
            SymmetryOperator::default(),
            ElementSet::of_unsorted(set),
        )?;
    }
    Ok(())
}

fn add_coarse_units(
    builder: &mut StructureBuilder,
    model: &Arc<Model>,
    elements: &CoarseElements,
    kind: UnitKind,
) -> Result<(), EngineError> {
    let segments = &elements.chain_element_segments;
    for c in 0..segments.count() {
        let Some(bounds) = segments.bounds(c) else {
            continue;
        };
        builder.add_unit(kind, model, SymmetryOperator::default(), ElementSet::of_bounds(bounds))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::{CoarseRow, ModelBuilder};
    use crate::engine::config::StructureConfigBuilder;
    use crate::engine::structure::structure::Structure;
    use nalgebra::Point3;

    /// One chain per entry of `sizes`, each chain holding single-atom residues.
    fn model_with_chain_sizes(sizes: &[usize]) -> Arc<Model> {
        let mut b = ModelBuilder::new("chains");
        b.add_entity("1", EntityType::Polymer)
            .add_entity("2", EntityType::NonPolymer);
        for (i, &size) in sizes.iter().enumerate() {
            let entity = if size == 1 { "2" } else { "1" };
            b.start_chain(&format!("C{i}"), &format!("C{i}"), entity);
            for r in 0..size {
                b.start_residue(if size == 1 { "NA" } else { "ALA" }, r as i64 + 1)
                    .add_atom("CA", "C", Point3::new(i as f64 * 5.0, r as f64, 0.0));
            }
        }
        Arc::new(b.build().unwrap())
    }

    fn unit_sizes(structure: &Structure) -> Vec<usize> {
        structure.units().iter().map(|u| u.elements().len()).collect()
    }

    mod chain_merging {
        use super::*;

        #[test]
        fn single_atom_chains_merge_with_two_chain_lookahead() {
            let model = model_with_chain_sizes(&[50, 1, 1, 1, 12]);
            let s = Structure::of_model(&model).unwrap();
            assert_eq!(unit_sizes(&s), vec![50, 3, 12]);
            assert_eq!(s.element_count(), 66);
        }

        #[test]
        fn trailing_single_atom_chain_stays_alone() {
            let model = model_with_chain_sizes(&[5, 1]);
            let s = Structure::of_model(&model).unwrap();
            assert_eq!(unit_sizes(&s), vec![5, 1]);
        }

        #[test]
        fn pair_of_single_atom_chains_is_not_merged_into_the_last() {
            let model = model_with_chain_sizes(&[1, 1]);
            let s = Structure::of_model(&model).unwrap();
            assert_eq!(unit_sizes(&s), vec![2]);

            let model = model_with_chain_sizes(&[3, 1, 1]);
            let s = Structure::of_model(&model).unwrap();
            assert_eq!(unit_sizes(&s), vec![3, 2]);
        }

        #[test]
        fn unit_ids_follow_emission_order() {
            let model = model_with_chain_sizes(&[4, 4, 4]);
            let s = Structure::of_model(&model).unwrap();
            let ids: Vec<_> = s.units().iter().map(|u| u.id()).collect();
            assert_eq!(ids, vec![0, 1, 2]);
            let invariant: Vec<_> = s.units().iter().map(|u| u.invariant_id()).collect();
            assert_eq!(invariant, vec![0, 1, 2]);
        }
    }

    mod water {
        use super::*;

        fn water_model(xs: &[f64]) -> Arc<Model> {
            let mut b = ModelBuilder::new("water");
            b.add_entity("1", EntityType::Water);
            b.start_chain("W", "W", "1");
            for (i, &x) in xs.iter().enumerate() {
                b.start_residue("HOH", i as i64 + 1)
                    .add_atom("O", "O", Point3::new(x, 0.0, 0.0));
            }
            Arc::new(b.build().unwrap())
        }

        #[test]
        fn water_chain_is_bucketed_by_grid_cell() {
            let model = water_model(&[0.0, 1.0, 100.0, 101.0, 200.0]);
            let s = Structure::of_model(&model).unwrap();
            let sets: Vec<Vec<usize>> = s
                .units()
                .iter()
                .map(|u| u.elements().as_slice().to_vec())
                .collect();
            assert_eq!(sets, vec![vec![0, 1], vec![2, 3], vec![4]]);
        }

        #[test]
        fn cell_size_is_configurable() {
            let model = water_model(&[0.0, 1.0, 100.0, 101.0, 200.0]);
            let config = StructureConfigBuilder::new()
                .grid_cell_size(500.0)
                .build()
                .unwrap();
            let s = Structure::of_model_with_config(&model, config).unwrap();
            assert_eq!(unit_sizes(&s), vec![5]);
        }
    }

    #[test]
    fn coarse_segments_become_units_after_atomic_ones() {
        let mut b = ModelBuilder::new("coarse");
        b.add_entity("1", EntityType::Polymer);
        b.start_chain("A", "A", "1")
            .start_residue("ALA", 1)
            .add_atom("CA", "C", Point3::origin());
        let bead = |seq: i64| CoarseRow {
            seq_id_begin: seq,
            seq_id_end: seq,
            position: Point3::new(seq as f64 * 4.0, 0.0, 0.0),
            radius: 2.0,
        };
        b.add_spheres("1", "A", [bead(1), bead(2)])
            .add_spheres("1", "B", [bead(1)])
            .add_gaussians("1", "A", [bead(1)]);
        let model = Arc::new(b.build().unwrap());
        let s = Structure::of_model(&model).unwrap();
        let kinds: Vec<_> = s.units().iter().map(|u| u.kind()).collect();
        assert_eq!(
            kinds,
            vec![UnitKind::Atomic, UnitKind::Spheres, UnitKind::Spheres, UnitKind::Gaussians]
        );
        assert_eq!(unit_sizes(&s), vec![1, 2, 1, 1]);
        assert_eq!(s.element_count(), model.element_count());
    }

    #[test]
    fn chain_without_entity_fails() {
        let mut b = ModelBuilder::new("orphan");
        b.add_entity("1", EntityType::Polymer);
        b.start_chain("A", "A", "1")
            .start_residue("ALA", 1)
            .add_atom("CA", "C", Point3::origin());
        b.start_chain("B", "B", "9")
            .start_residue("ALA", 1)
            .add_atom("CA", "C", Point3::new(3.0, 0.0, 0.0))
            .add_atom("CB", "C", Point3::new(4.0, 0.0, 0.0));
        let model = Arc::new(b.build().unwrap());
        assert_eq!(
            Structure::of_model(&model).unwrap_err(),
            EngineError::MissingEntity { chain_index: 1 }
        );
    }
}
