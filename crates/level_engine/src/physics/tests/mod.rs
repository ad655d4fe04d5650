//! Whole-pipeline tests: level text in, body trajectories and notifications out
