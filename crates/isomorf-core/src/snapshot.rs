use isomorf_domain_layout::{LayoutError, LayoutMapper, LayoutParams, SurfaceGeometry, Zone};
use isomorf_ports::types::{SurfacePoint, SurfaceSize};

/// The layout a gesture is classified against: parameters, the mapper chosen
/// for their tiling, and the surface partition for the current size.
pub struct LayoutSnapshot {
    params: LayoutParams,
    mapper: Box<dyn LayoutMapper>,
    geometry: SurfaceGeometry,
}

impl LayoutSnapshot {
    pub fn new(params: LayoutParams, size: SurfaceSize) -> Result<Self, LayoutError> {
        params.validate()?;
        let geometry = SurfaceGeometry::new(size, params.rows, params.cols)?;
        Ok(Self {
            params,
            mapper: params.mapper(),
            geometry,
        })
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn mapper(&self) -> &dyn LayoutMapper {
        self.mapper.as_ref()
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn size(&self) -> SurfaceSize {
        self.geometry.size()
    }

    pub fn classify(&self, point: SurfacePoint) -> Zone {
        self.geometry.classify(self.mapper.as_ref(), point)
    }

    pub fn resize(&mut self, size: SurfaceSize) -> Result<(), LayoutError> {
        self.geometry = SurfaceGeometry::new(size, self.params.rows, self.params.cols)?;
        Ok(())
    }
}
