//! Summary line and tabulated data files
use super::{configuration::OutputConfiguration, Calculation};
use crate::{hamiltonian::ModelParameters, spectral::EnergyGrid, spectral::SpectralPair};
use itertools::Itertools;
use std::{
    f64::consts::PI,
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

const SUMMARY_COLUMNS: [&str; 15] = [
    "U", "GammaR", "GammaL", "eps", "Phi/pi", "wABS", "n", "mu", "ResGn1", "ResGn2", "ResGa1",
    "J_band", "J_gap", "J", "wABS_HF",
];

/// The commented header of the summary line
pub(crate) fn summary_header() -> String {
    format!("# {}", SUMMARY_COLUMNS.iter().join("\t"))
}

/// The tab separated summary of a converged calculation
pub(crate) fn summary_line(calculation: &Calculation) -> String {
    let parameters = &calculation.parameters;
    let [res_lower, res_upper, res_anomalous] = calculation.residues();
    let current = calculation.josephson_current;
    let inputs = [
        parameters.interaction(),
        parameters.gamma_right(),
        parameters.gamma_left(),
        parameters.level(),
        parameters.phase() / PI,
    ]
    .into_iter()
    .map(|x| format!("{:.3}", x));
    let outputs = [
        calculation.bound_state_energy(),
        calculation.state.occupation,
        calculation.state.pairing,
        res_lower,
        res_upper,
        res_anomalous,
        current.band,
        current.gap,
        current.total(),
        calculation.hartree_fock.bound_state_energy(),
    ]
    .into_iter()
    .map(|x| format!("{:.5}", x));
    inputs.chain(outputs).join("\t")
}

fn file_header(parameters: &ModelParameters, marker: f64, description: &str) -> String {
    format!(
        concat!(
            "# {} generated by squad {} on {}\n",
            "# U = {:.3}, Delta = {:.3}, GammaR = {:.3}, GammaL = {:.3}, GammaN = {:.3}\n",
            "# eps = {:.3}, Phi/pi = {:.3}\n",
            "# marker = {:.5}\n",
            "# E\tRe(normal)\tIm(normal)\tRe(anomalous)\tIm(anomalous)"
        ),
        description,
        env!("CARGO_PKG_VERSION"),
        chrono::Local::now().to_rfc3339(),
        parameters.interaction(),
        parameters.gap(),
        parameters.gamma_right(),
        parameters.gamma_left(),
        parameters.gamma_normal(),
        parameters.level(),
        parameters.phase() / PI,
        marker
    )
}

/// Write a pair of functions restricted to `|E| <= maximum_energy`, thinned to `energy_step`
pub(crate) fn write_pair(
    path: &Path,
    header: &str,
    grid: &EnergyGrid,
    pair: &SpectralPair,
    settings: &OutputConfiguration,
) -> std::io::Result<()> {
    let stride = ((settings.energy_step / grid.step()).round() as usize).max(1);
    let centre = grid.centre().index();
    let mut writer = BufWriter::new(fs::File::create(path)?);
    writeln!(writer, "{}", header)?;
    for position in grid.positions() {
        let energy = grid.energy_at(position);
        let on_stride = position.index().abs_diff(centre) % stride == 0;
        if energy.abs() > settings.maximum_energy || !on_stride {
            continue;
        }
        let (normal, anomalous) = (
            pair.normal[position.index()],
            pair.anomalous[position.index()],
        );
        writeln!(
            writer,
            "{:.6}\t{:.8e}\t{:.8e}\t{:.8e}\t{:.8e}",
            energy, normal.re, normal.im, anomalous.re, anomalous.im
        )?;
    }
    writer.flush()
}

/// Write the data files requested in the configuration, returning their paths
pub(crate) fn write_data_files(
    calculation: &Calculation,
    settings: &OutputConfiguration,
) -> std::io::Result<Vec<PathBuf>> {
    let grid = &calculation.grid;
    let parameters = &calculation.parameters;
    let hartree_fock_pole = calculation.hartree_fock.bound_state_energy();
    let requested = [
        (
            settings.write_hartree_fock_greens,
            "hartree_fock_greens.dat",
            "Hartree-Fock Green's functions",
            hartree_fock_pole,
            calculation
                .hartree_fock
                .greens_functions
                .with_bound_state_weights(grid),
        ),
        (
            settings.write_bubbles,
            "bubbles.dat",
            "Hartree-Fock bubbles",
            hartree_fock_pole,
            calculation.self_energy.bubbles().as_pair().clone(),
        ),
        (
            settings.write_self_energy,
            "self_energy.dat",
            "Second order self-energy",
            0.,
            calculation.self_energy.as_pair().clone(),
        ),
        (
            settings.write_second_order_greens,
            "second_order_greens.dat",
            "Second order Green's functions",
            calculation.bound_state_energy(),
            calculation.greens_functions.with_bound_state_weights(grid),
        ),
    ];

    let mut written = Vec::new();
    for (enabled, name, description, marker, pair) in requested {
        if !enabled {
            continue;
        }
        fs::create_dir_all(&settings.directory)?;
        let path = settings.directory.join(name);
        write_pair(
            &path,
            &file_header(parameters, marker, description),
            grid,
            &pair,
            settings,
        )?;
        tracing::info!("{} written to {}", description, path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod test {
    use super::{file_header, summary_header, summary_line, write_pair, SUMMARY_COLUMNS};
    use crate::{
        app::{configuration::OutputConfiguration, second_order_calculation, Calculation},
        hamiltonian::ModelParameters,
        spectral::{EnergyGridBuilder, SpectralPair},
        Configuration,
    };

    fn calculate(interaction: f64, level: f64) -> Calculation {
        let mut configuration = Configuration::default();
        configuration.grid.step = 0.02;
        configuration.grid.exponent = 12;
        configuration.outer_loop.tolerance = 1e-7;
        configuration.outer_loop.root_tolerance = 1e-10;
        let parameters =
            ModelParameters::from_reduced(interaction, 1., 0.5, 1., level, 0.).unwrap();
        second_order_calculation(&parameters, &configuration).unwrap()
    }

    fn column(line: &str, name: &str) -> String {
        let idx = SUMMARY_COLUMNS.iter().position(|&c| c == name).unwrap();
        line.split('\t').nth(idx).unwrap().to_string()
    }

    #[test]
    fn header_names_every_column() {
        let header = summary_header();
        assert!(header.starts_with('#'));
        assert_eq!(
            header.trim_start_matches("# ").split('\t').count(),
            SUMMARY_COLUMNS.len()
        );
    }

    #[test]
    fn data_file_header_is_commented() {
        let parameters = ModelParameters::from_reduced(1., 1., 0.5, 1., 0.2, 0.5).unwrap();
        let header = file_header(&parameters, 0.25, "test");
        assert!(header.lines().all(|line| line.starts_with('#')));
        assert!(header.contains("GammaN = 0.000"));
        assert!(header.contains("Phi/pi = 0.500"));
        assert!(header.contains("marker = 0.25000"));
    }

    #[test]
    fn summary_line_fills_every_column() {
        let calculation = calculate(1., 0.3);
        let line = summary_line(&calculation);
        let fields = line.split('\t').collect::<Vec<_>>();
        assert_eq!(fields.len(), SUMMARY_COLUMNS.len());
        assert!(fields.iter().all(|field| field.parse::<f64>().is_ok()));
        assert_eq!(column(&line, "U"), "1.000");
        assert_eq!(column(&line, "eps"), "0.300");
        assert_eq!(
            column(&line, "wABS"),
            format!("{:.5}", calculation.bound_state_energy())
        );
    }

    #[test]
    fn summary_reports_the_converged_loop_state() {
        for interaction in [1., 2.] {
            let calculation = calculate(interaction, 0.);
            let line = summary_line(&calculation);
            assert_eq!(column(&line, "n"), "0.50000");
            assert_eq!(
                column(&line, "mu"),
                format!("{:.5}", calculation.state.pairing)
            );
        }
    }

    #[test]
    fn data_files_are_restricted_and_thinned() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.01)
            .with_exponent(10)
            .build()
            .unwrap();
        let pair = SpectralPair::zeros(grid.len());
        let directory = std::env::temp_dir().join("squad-output-test");
        std::fs::create_dir_all(&directory).unwrap();
        let path = directory.join("pair.dat");
        let settings = OutputConfiguration {
            maximum_energy: 1.001,
            energy_step: 0.05,
            ..OutputConfiguration::default()
        };
        write_pair(&path, "# test", &grid, &pair, &settings).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let rows = contents
            .lines()
            .filter(|line| !line.starts_with('#'))
            .map(|line| line.split('\t').next().unwrap().parse::<f64>().unwrap())
            .collect::<Vec<_>>();
        // -1.00, -0.95, ..., 1.00
        assert_eq!(rows.len(), 41);
        assert!(rows.iter().any(|&e| e == 0.));
        assert!(rows.iter().all(|e| e.abs() <= 1.001));
    }
}
