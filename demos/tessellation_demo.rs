//! End-to-end workflow for geo_tessellation
//!
//! Run with `RUST_LOG=debug` to see the library's tracing output.

use geo_tessellation::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== geo_tessellation Demo ===\n");
    let bbox = BoundingBox::new(0.0, 0.0, 100.0, 60.0)?;

    // Step 1: Grids
    println!("Step 1: Grids over {}x{}", bbox.width(), bbox.height());
    for topology in [GridTopology::Point, GridTopology::Square, GridTopology::Triangle, GridTopology::Hex] {
        let cells = grid::generate(&bbox, &GridOptions::new(10.0, topology)?)?;
        println!("  {:<8} {} features", topology.name(), cells.len());
    }

    // Step 2: Samples with a value field
    println!("\nStep 2: Sampling...");
    let mut samples = random_point_features(&bbox, 40, 12345);
    for feature in &mut samples.features {
        if let Some(p) = feature.geometry.as_ref().and_then(|g| g.representative_point()) {
            let value = 50.0 + 30.0 * (p.x / 20.0).sin() * (p.y / 15.0).cos();
            feature.set_number(DEFAULT_VALUE_PROPERTY, value);
        }
    }
    println!("  {} samples", samples.len());

    // Step 3: IDW onto a lattice, then contours
    println!("\nStep 3: Interpolation and contours...");
    let lattice = GridOptions::new(5.0, GridTopology::Point)?;
    let field = field::interpolate_grid(&samples, &bbox, &lattice, &IdwOptions::default())?;
    println!("  Field nodes: {}", field.len());

    let breaks = [20.0, 35.0, 50.0, 65.0, 80.0];
    let options = ContourOptions::default();
    let lines = contour::extract_from_points(&field, &breaks, ContourMode::Lines, &options)?;
    let bands = contour::extract_from_points(&field, &breaks, ContourMode::Bands, &options)?;
    println!("  Isolines: {}  Isobands: {}", lines.len(), bands.len());

    // Step 4: TIN
    println!("\nStep 4: Triangulation...");
    let tin = triangulate(&samples, Some(DEFAULT_VALUE_PROPERTY))?;
    println!("  Triangles: {}", tin.len());

    // Step 5: Voronoi with relaxation
    println!("\nStep 5: Voronoi...");
    let sites = random_points(&bbox, 40, 12345);
    let relaxed = lloyd_relaxation(sites, &bbox, &LloydOptions::default())?;
    let diagram = VoronoiDiagram::new(&relaxed, &bbox)?;
    let mean_neighbors = diagram.cells().iter().map(|c| c.neighbor_count()).sum::<usize>() as f64
        / diagram.cell_count() as f64;
    println!("  Cells: {}  mean neighbors: {:.2}", diagram.cell_count(), mean_neighbors);

    #[cfg(feature = "spatial-index")]
    {
        let probe = DVec2::new(50.0, 30.0);
        if let Some(id) = diagram.find_cell_at(probe) {
            let ring = diagram.find_cells_within_hops(id, 2);
            println!("  {:?} -> cell {} ({} cells within 2 hops)", probe, id, ring.len());
        }
    }

    // Step 6: Hulls
    println!("\nStep 6: Hulls...");
    let convex = convex_hull(&samples, &ConvexHullOptions::default())?;
    let concave = convex_hull(&samples, &ConvexHullOptions { concavity: Some(2.0) })?;
    println!("  Convex: {} vertices", convex.geometry.map_or(0, |g| g.positions().len()));
    println!("  Concave: {} vertices", concave.geometry.map_or(0, |g| g.positions().len()));

    // Step 7: Polygonize the square grid's outlines
    println!("\nStep 7: Polygonize...");
    let squares = grid::generate(&bbox, &GridOptions::new(20.0, GridTopology::Square)?)?;
    let rebuilt = polygonize(&squares)?;
    println!("  {} squares in, {} polygons out", squares.len(), rebuilt.len());

    let json = bands.to_geojson_string()?;
    println!("\nIsobands GeoJSON: {} bytes", json.len());

    println!("\n=== Demo Complete ===");
    Ok(())
}
