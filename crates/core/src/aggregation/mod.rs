pub mod rect_aggregator;
