use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use obs2nc::generator::{ContainerGenerator, RenderOptions};
use obs2nc::records::Record;
use obs2nc::schema::SchemaDeclaration;
use serde_json::{json, Value};
use tempfile::TempDir;

const RADAR_SCHEMA: &str = include_str!("../tests/data/micro_rain_radar.json");

/// Generate synthetic radar records
fn generate_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let spectra: Vec<Vec<f64>> = (0..32)
                .map(|h| (0..64).map(|c| ((i + h * c) % 97) as f64 * 0.5).collect())
                .collect();
            let value = json!({
                "Datetime": format!("2024-03-01 {:02}:{:02}:{:02}", i / 3600 % 24, i / 60 % 60, i % 60),
                "HGT": (0..32).map(|h| 35 * (h + 1)).collect::<Vec<u32>>(),
                "Transfer_function": (0..32).map(|h| h as f64 * 0.01).collect::<Vec<f64>>(),
                "Spectral_reflectivities": spectra,
                "Q_data": (i % 4) as u8,
                "station_name": "Xueshan",
                "station_id": "56691",
                "latitude": 26.86,
                "longitude": 104.28,
                "altitude": 2234,
                "station_type": 40,
                "station_level": "11",
                "Device_version": "DVS: 6.00",
                "Devi_seri_numb": "DSN: 0505123820",
                "BW": "BW: 40200",
                "Calibration_constant": "CC: 2279042",
                "MMR_data_qual": "MDQ: 100",
                "Data_level": "Lraw",
            });
            match value {
                Value::Object(map) => map,
                _ => unreachable!(),
            }
        })
        .collect()
}

fn bench_compile(c: &mut Criterion) {
    let declaration = SchemaDeclaration::from_json_str(RADAR_SCHEMA).unwrap();
    c.bench_function("compile_radar_schema", |b| {
        b.iter(|| declaration.compile().unwrap())
    });
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let generator = ContainerGenerator::from_json_str(RADAR_SCHEMA).unwrap();
    let dir = TempDir::new().unwrap();

    for count in [10usize, 100, 360] {
        let records = generate_records(count);
        let options =
            RenderOptions::from_batch(&records, "Datetime").created_at("2024-03-02 00:00:00");
        let target = dir.path().join(format!("bench_{}.nc", count));

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &records, |b, records| {
            b.iter(|| generator.render_with(&target, records, &options).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_render);
criterion_main!(benches);
