//! different utility modules used throughout the project
/// terminal and file logging set up with simplelog
pub mod logger;
/// contour lines and 3D surface of a sampled field, PNG (plotters) or window (gnuplot)
pub mod plots;
/// parse document with structure like " title1 key1: value1, value2 key2: value2 title2 key3:value3, value4" into HashMap
pub mod task_parser;
///
mod task_parser_tests;
