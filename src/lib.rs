// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! Contour and 3D surface plots of user-typed functions of x and y.
//!
//! The expression goes through a restricted parser (`symbolic`), extra variables are
//! fixed by the user, the result is compiled into an array function, sampled on a grid
//! (`numerical::sampler`) and drawn (`Utils::plots`). The annotated session also finds and
//! classifies the critical points (`numerical::critical_points`).
pub mod Utils;
pub mod errors;
pub mod numerical;
pub mod session;
pub mod symbolic;
