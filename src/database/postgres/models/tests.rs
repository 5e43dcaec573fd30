use super::*;

#[test]
fn distance_operators() {
    assert_eq!(DistanceMetric::Cosine.operator(), "<=>");
    assert_eq!(DistanceMetric::L2.operator(), "<->");
    assert_eq!(DistanceMetric::InnerProduct.operator(), "<#>");
}

#[test]
fn distance_display_matches_config_names() {
    for metric in [
        DistanceMetric::Cosine,
        DistanceMetric::L2,
        DistanceMetric::InnerProduct,
    ] {
        let json = serde_json::to_string(&metric).expect("metric should serialize");
        assert_eq!(json, format!("\"{metric}\""));
    }
}

#[test]
fn default_metric_is_cosine() {
    assert_eq!(DistanceMetric::default(), DistanceMetric::Cosine);
}

#[test]
fn chunk_record_dimension() {
    let record = ChunkRecord {
        id: 1,
        content: "Llamas are social animals and live in herds".to_string(),
        embedding: Vector::from(vec![0.1, 0.2, 0.3]),
    };
    assert_eq!(record.dimension(), 3);
}
