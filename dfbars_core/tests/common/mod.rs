//! Diauxic growth of a bacterium on glucose and acetate in a batch bioreactor
#![allow(dead_code)]
use std::path::PathBuf;

use dfbars_core::configuration::Solver;
use dfbars_core::dfba::bounds::KineticLimit;
use dfbars_core::dfba::coupler::{CouplingBindings, CouplingBindingsBuilder};
use dfbars_core::dfba::fba_model::FbaModel;
use dfbars_core::metabolic_model::model::Model;
use dfbars_core::ode::bioreactor::BioreactorModel;

pub const EXCHANGES: [(&str, &str); 4] = [
    ("EX_Ac", "Ac"),
    ("EX_Glcxt", "Glcxt"),
    ("EX_O2", "O2"),
    ("EX_X", "X"),
];

pub fn diauxic_model() -> Model {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join("test_models")
        .join("diauxic_growth.json");
    Model::read_json(path).unwrap()
}

pub fn diauxic_fba(solver: Solver) -> FbaModel {
    FbaModel::new(diauxic_model()).unwrap().with_solver(solver)
}

/// Pools of the reactor, with oxygen transfer from the gas phase
pub fn diauxic_reactor(glucose: f64, biomass: f64) -> BioreactorModel {
    let mut reactor = BioreactorModel::new();
    reactor.add_species("Glcxt", glucose).unwrap();
    reactor.add_species("Ac", 0.4).unwrap();
    let o2 = reactor.add_species("O2", 0.21).unwrap();
    reactor.add_species("X", biomass).unwrap();
    for (reaction, species) in EXCHANGES {
        reactor
            .add_flux_update(reaction, &format!("v_{reaction}"), species, "X", 1.)
            .unwrap();
    }
    let kla = reactor.add_parameter("kLa", 7.5).unwrap();
    reactor
        .add_kinetic_rate("O2", move |species, parameters| {
            parameters[kla] * (0.21 - species[o2])
        })
        .unwrap();
    reactor
}

pub fn diauxic_bindings() -> CouplingBindings {
    let mut builder = CouplingBindingsBuilder::default();
    builder
        .biomass("X")
        .exchange("EX_Ac", "Ac", KineticLimit::Declared)
        .exchange(
            "EX_Glcxt",
            "Glcxt",
            KineticLimit::MichaelisMenten {
                vmax: 10.,
                km: 0.015,
            },
        )
        .exchange("EX_O2", "O2", KineticLimit::Fixed(-15.))
        .exchange("EX_X", "X", KineticLimit::Declared);
    for (reaction, _) in EXCHANGES {
        builder.flux(reaction, &format!("v_{reaction}"), reaction);
    }
    builder.build().unwrap()
}
