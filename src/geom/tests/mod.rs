mod test_curve_basic;
mod test_mesh_projection;
mod test_ribbon_basic;
mod test_surface_basic;
