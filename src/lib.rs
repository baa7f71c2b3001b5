//! Label forge: upload a 3D model and a label image, get back a Blender script
//! that applies the label at its real-world size (or rescales the model), and
//! optionally run it headless on the server.

pub mod web;
